//! Browser implementations of the counter host capabilities.
//!
//! Closures handed to the browser hold a `Weak` back-reference to the driver,
//! so dropping `VizijCounters` frees everything. Browser callbacks never run
//! while another driver borrow is live.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::Array;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use vizij_counter_core::ids::IdAllocator;
use vizij_counter_core::{
    Clock, CounterError, Driver, FrameScheduler, ObserveOptions, Subscription, TargetId,
    TextSurface, ValueSource, VisibilityEvent, VisibilitySource,
};

pub type WebDriver = Driver<WebClock, RafScheduler, DomSurface, DomVisibility>;

/// Attribute stamped on observed elements so observer entries map back to a handle.
pub const HANDLE_ATTR: &str = "data-vizij-counter";
/// Idempotency marker set on the display element when its counter starts.
pub const ANIMATED_ATTR: &str = "data-animated";

/// `performance.now()`, falling back to `Date.now()` outside a window.
pub struct WebClock {
    performance: Option<web_sys::Performance>,
}

impl WebClock {
    pub fn new() -> Self {
        Self {
            performance: web_sys::window().and_then(|w| w.performance()),
        }
    }
}

impl Default for WebClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WebClock {
    fn now_ms(&self) -> f64 {
        match &self.performance {
            Some(p) => p.now(),
            None => js_sys::Date::now(),
        }
    }
}

type FrameCallback = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame` scheduler calling back into `Driver::on_frame`.
///
/// A frame that lands while the driver is borrowed is requested again rather
/// than dropped, so a pending frame always eventually reaches the driver.
pub struct RafScheduler {
    callback: Rc<RefCell<Option<FrameCallback>>>,
    last_request: Rc<Cell<Option<i32>>>,
}

impl RafScheduler {
    pub fn new(driver: Weak<RefCell<WebDriver>>) -> Self {
        let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
        let last_request = Rc::new(Cell::new(None));

        let retry = Rc::downgrade(&callback);
        let retry_id = Rc::clone(&last_request);
        *callback.borrow_mut() = Some(Closure::new(move |_timestamp: f64| {
            retry_id.set(None);
            let Some(driver) = driver.upgrade() else {
                return;
            };
            match driver.try_borrow_mut() {
                Ok(mut d) => d.on_frame(),
                Err(_) => {
                    debug!("counter frame deferred: driver busy");
                    if let Some(callback) = retry.upgrade() {
                        retry_id.set(request(&callback));
                    }
                }
            };
        }));
        Self {
            callback,
            last_request,
        }
    }
}

fn request(callback: &RefCell<Option<FrameCallback>>) -> Option<i32> {
    let Some(window) = web_sys::window() else {
        warn!("no window; counters stay on their current frame");
        return None;
    };
    let callback = callback.borrow();
    let callback = callback.as_ref()?;
    match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(id) => Some(id),
        Err(err) => {
            warn!("requestAnimationFrame failed: {err:?}");
            None
        }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> bool {
        let id = request(&self.callback);
        self.last_request.set(id);
        id.is_some()
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        if let (Some(id), Some(window)) = (self.last_request.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
    }
}

/// Display elements keyed by handle.
#[derive(Default)]
pub struct DomSurface {
    elements: HashMap<String, Element>,
}

impl DomSurface {
    pub fn insert(&mut self, handle: &str, display: Element) {
        self.elements.insert(handle.to_string(), display);
    }

    pub fn remove(&mut self, handle: &str) {
        self.elements.remove(handle);
    }

    /// Whether some live counter already displays into `display`.
    pub fn contains_element(&self, display: &Element) -> bool {
        self.elements.values().any(|el| el == display)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl TextSurface for DomSurface {
    fn read_source(&self, handle: &str, source: &ValueSource) -> Option<String> {
        let el = self.elements.get(handle)?;
        match source {
            ValueSource::Text => el.text_content(),
            ValueSource::Attribute { name } => el.get_attribute(name),
        }
    }

    fn write_text(&mut self, handle: &str, text: &str) -> Result<(), CounterError> {
        match self.elements.get(handle) {
            Some(el) if el.is_connected() => {
                el.set_text_content(Some(text));
                Ok(())
            }
            _ => Err(CounterError::Detached {
                handle: handle.to_string(),
            }),
        }
    }

    fn mark_animated(&mut self, handle: &str) {
        if let Some(el) = self.elements.get(handle) {
            if let Err(err) = el.set_attribute(ANIMATED_ATTR, "true") {
                debug!("could not mark {handle:?}: {err:?}");
            }
        }
    }

    fn is_marked(&self, handle: &str) -> bool {
        self.elements
            .get(handle)
            .is_some_and(|el| el.has_attribute(ANIMATED_ATTR))
    }

    fn release(&mut self, handle: &str) {
        self.elements.remove(handle);
    }
}

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// One `IntersectionObserver` per distinct (threshold, rootMargin) pair.
pub struct DomVisibility {
    driver: Weak<RefCell<WebDriver>>,
    ids: IdAllocator,
    observers: HashMap<String, (IntersectionObserver, ObserverCallback)>,
    /// Observed element and observer key per handle.
    watched: HashMap<String, (Element, Option<String>)>,
}

impl DomVisibility {
    pub fn new(driver: Weak<RefCell<WebDriver>>) -> Self {
        Self {
            driver,
            ids: IdAllocator::new(),
            observers: HashMap::new(),
            watched: HashMap::new(),
        }
    }

    /// Remember which element to observe for `handle`; `observe` picks it up.
    pub fn watch(&mut self, handle: &str, observed: Element) {
        self.watched.insert(handle.to_string(), (observed, None));
    }

    pub fn forget(&mut self, handle: &str) {
        self.watched.remove(handle);
    }

    pub fn disconnect_all(&mut self) {
        for (observer, _) in self.observers.values() {
            observer.disconnect();
        }
        self.observers.clear();
        self.watched.clear();
    }

    fn observer_for(&mut self, opts: &ObserveOptions) -> Option<IntersectionObserver> {
        let key = observer_key(opts);
        if let Some((observer, _)) = self.observers.get(&key) {
            return Some(observer.clone());
        }

        let driver = self.driver.clone();
        let callback = ObserverCallback::new(move |entries: Array, _obs: IntersectionObserver| {
            let Some(driver) = driver.upgrade() else {
                return;
            };
            let Ok(mut d) = driver.try_borrow_mut() else {
                warn!("visibility report dropped: driver busy");
                return;
            };
            let events: Vec<VisibilityEvent> = entries
                .iter()
                .filter_map(|entry| {
                    let entry: IntersectionObserverEntry = entry.dyn_into().ok()?;
                    let handle = entry.target().get_attribute(HANDLE_ATTR)?;
                    let target = d.engine().find_by_handle(&handle)?;
                    Some(VisibilityEvent {
                        target,
                        is_intersecting: entry.is_intersecting(),
                        ratio: entry.intersection_ratio() as f32,
                    })
                })
                .collect();
            d.handle_visibility(&events);
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(opts.threshold as f64));
        init.set_root_margin(&opts.root_margin);
        let observer =
            match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
            {
                Ok(o) => o,
                Err(err) => {
                    warn!("IntersectionObserver unavailable ({err:?}); counters stay static");
                    return None;
                }
            };
        self.observers.insert(key, (observer.clone(), callback));
        Some(observer)
    }
}

fn observer_key(opts: &ObserveOptions) -> String {
    format!("{}|{}", opts.threshold, opts.root_margin)
}

impl VisibilitySource for DomVisibility {
    fn observe(
        &mut self,
        target: TargetId,
        handle: &str,
        opts: &ObserveOptions,
    ) -> Option<Subscription> {
        let element = self.watched.get(handle)?.0.clone();
        let observer = self.observer_for(opts)?;
        element.set_attribute(HANDLE_ATTR, handle).ok()?;
        observer.observe(&element);
        if let Some(entry) = self.watched.get_mut(handle) {
            entry.1 = Some(observer_key(opts));
        }
        Some(Subscription {
            id: self.ids.alloc_subscription(),
            target,
            handle: handle.to_string(),
        })
    }

    fn unobserve(&mut self, sub: &Subscription) {
        let Some((element, key)) = self.watched.remove(&sub.handle) else {
            return;
        };
        if let Some((observer, _)) = key.and_then(|k| self.observers.get(&k)) {
            observer.unobserve(&element);
        }
    }
}

impl Drop for DomVisibility {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}
