use std::cell::RefCell;
use std::rc::Rc;

use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use vizij_counter_core::{Config, CounterConfig, Driver, Engine, TargetId};

mod host;
mod logger;

pub use host::{ANIMATED_ATTR, HANDLE_ATTR};
use host::{DomSurface, DomVisibility, RafScheduler, WebClock, WebDriver};

/// Visibility-triggered counters for the current document.
#[wasm_bindgen]
pub struct VizijCounters {
    driver: Rc<RefCell<WebDriver>>,
    next_handle: u32,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn counter_config(value: JsValue, fallback: &CounterConfig) -> Result<CounterConfig, JsError> {
    let cfg: CounterConfig = if jsvalue_is_undefined_or_null(&value) {
        fallback.clone()
    } else {
        swb::from_value(value).map_err(|e| JsError::new(&format!("counter config error: {e}")))?
    };
    cfg.validate()
        .map_err(|e| JsError::new(&format!("counter config error: {e}")))?;
    Ok(cfg)
}

fn document() -> Result<Document, JsError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsError::new("no document available"))
}

#[wasm_bindgen]
impl VizijCounters {
    /// Create a counter set. Pass a JSON counter config used as the default for
    /// every registration, or undefined/null for the stat-card defaults.
    /// Example:
    ///   new VizijCounters({ duration_ms: 2000, easing: { type: "ease_out_quad" } })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<VizijCounters, JsError> {
        console_error_panic_hook::set_once();

        let defaults = counter_config(config, &CounterConfig::default())?;
        let cfg = Config {
            defaults,
            ..Config::default()
        };

        let driver = Rc::new_cyclic(|weak| {
            RefCell::new(Driver::new(
                Engine::new(cfg),
                WebClock::new(),
                RafScheduler::new(weak.clone()),
                DomSurface::default(),
                DomVisibility::new(weak.clone()),
            ))
        });
        Ok(VizijCounters {
            driver,
            next_handle: 0,
        })
    }

    /// Register one element. Returns its counter id, or undefined when the element
    /// holds no usable number (it is left untouched).
    #[wasm_bindgen]
    pub fn register(&mut self, element: Element, config: JsValue) -> Result<Option<u32>, JsError> {
        let cfg = self.resolve_config(config)?;
        Ok(self.attach(element.clone(), element, cfg))
    }

    /// Register every element matching `selector`. Returns how many were accepted.
    #[wasm_bindgen]
    pub fn scan(&mut self, selector: &str, config: JsValue) -> Result<u32, JsError> {
        let cfg = self.resolve_config(config)?;
        let mut count = 0;
        for el in query_all(&document()?, selector)? {
            if self.attach(el.clone(), el, cfg.clone()).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Observe each card matching `card_selector` and animate its first descendant
    /// matching `number_selector`. Returns how many were accepted.
    #[wasm_bindgen(js_name = scan_cards)]
    pub fn scan_cards(
        &mut self,
        card_selector: &str,
        number_selector: &str,
        config: JsValue,
    ) -> Result<u32, JsError> {
        let cfg = self.resolve_config(config)?;
        let mut count = 0;
        for card in query_all(&document()?, card_selector)? {
            let number = card
                .query_selector(number_selector)
                .map_err(|e| JsError::new(&format!("invalid selector {number_selector:?}: {e:?}")))?;
            let Some(number) = number else {
                continue;
            };
            if self.attach(card, number, cfg.clone()).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// "idle" | "running" | "completed", or undefined for unknown ids.
    #[wasm_bindgen]
    pub fn state(&self, id: u32) -> Option<String> {
        self.driver
            .borrow()
            .engine()
            .state(TargetId(id))
            .map(|s| s.as_str().to_string())
    }

    #[wasm_bindgen(js_name = running_count)]
    pub fn running_count(&self) -> u32 {
        self.driver.borrow().engine().running_count() as u32
    }

    /// Elements still held for counters that have not finished.
    #[wasm_bindgen(js_name = tracked_count)]
    pub fn tracked_count(&self) -> u32 {
        self.driver.borrow().surface().len() as u32
    }

    /// Stop observing. Counters already running jump to their final value.
    #[wasm_bindgen]
    pub fn shutdown(&mut self) {
        let mut d = self.driver.borrow_mut();
        d.shutdown();
        d.visibility_mut().disconnect_all();
    }
}

impl VizijCounters {
    fn resolve_config(&self, config: JsValue) -> Result<CounterConfig, JsError> {
        let defaults = self.driver.borrow().engine().config().defaults.clone();
        counter_config(config, &defaults)
    }

    fn attach(&mut self, observed: Element, display: Element, cfg: CounterConfig) -> Option<u32> {
        let mut d = self.driver.borrow_mut();
        if d.surface().contains_element(&display) {
            log::debug!("element already has a counter; skipping");
            return None;
        }
        let handle = format!("vc-{}", self.next_handle);
        self.next_handle += 1;

        d.surface_mut().insert(&handle, display);
        d.visibility_mut().watch(&handle, observed);
        match d.register_with(&handle, cfg) {
            Some(id) => Some(id.0),
            None => {
                d.surface_mut().remove(&handle);
                d.visibility_mut().forget(&handle);
                None
            }
        }
    }
}

fn query_all(doc: &Document, selector: &str) -> Result<Vec<Element>, JsError> {
    let list = doc
        .query_selector_all(selector)
        .map_err(|e| JsError::new(&format!("invalid selector {selector:?}: {e:?}")))?;
    Ok((0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

/// Install the console logger. `level` is a `log` level name ("debug", "warn", ...).
#[wasm_bindgen]
pub fn init_logging(level: Option<String>) {
    logger::install(level.as_deref());
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
