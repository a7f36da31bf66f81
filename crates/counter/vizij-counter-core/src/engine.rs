//! Engine: owns every registered counter and steps them against a clock reading.
//!
//! Methods:
//! - new, register / register_with / try_register, trigger, detach, update (visibility → advance)
//! - finish_running: jump every running counter to its final frame

use log::{debug, trace};

use crate::config::{Config, CounterConfig};
use crate::error::CounterError;
use crate::ids::{IdAllocator, TargetId};
use crate::inputs::{Inputs, VisibilityEvent};
use crate::outputs::{Change, CounterEvent, Outputs};
use crate::parse::parse_counter_text;
use crate::target::{AnimationState, CounterTarget};

#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    targets: Vec<CounterTarget>,

    // Events raised by trigger/detach, flushed on the next update
    pending_events: Vec<CounterEvent>,

    // Per-tick outputs
    outputs: Outputs,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    /// Create a new engine with the given config.
    pub fn new(cfg: Config) -> Self {
        Self {
            targets: Vec::with_capacity(cfg.capacity_hint),
            cfg,
            ids: IdAllocator::new(),
            pending_events: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Register a counter with the engine defaults. `None` if the text holds no usable value.
    pub fn register(&mut self, handle: &str, text: &str) -> Option<TargetId> {
        let cfg = self.cfg.defaults.clone();
        self.register_with(handle, text, cfg)
    }

    /// Register a counter with its own settings. `None` if the text or settings are unusable.
    pub fn register_with(
        &mut self,
        handle: &str,
        text: &str,
        cfg: CounterConfig,
    ) -> Option<TargetId> {
        match self.try_register(handle, text, cfg) {
            Ok(id) => Some(id),
            Err(err) => {
                debug!("skipping counter {handle:?} ({}): {err}", err.category());
                None
            }
        }
    }

    /// Register a counter, reporting why it was rejected.
    pub fn try_register(
        &mut self,
        handle: &str,
        text: &str,
        cfg: CounterConfig,
    ) -> Result<TargetId, CounterError> {
        cfg.validate()?;
        if self.find_by_handle(handle).is_some() {
            return Err(CounterError::Duplicate {
                handle: handle.to_string(),
            });
        }
        let parsed = parse_counter_text(text, cfg.digit_run)?;
        let id = self.ids.alloc_target();
        self.targets.push(CounterTarget::new(
            id,
            handle.to_string(),
            parsed.value,
            parsed.format,
            cfg,
        ));
        Ok(id)
    }

    /// Start a counter now. Returns false for unknown targets and repeated triggers.
    pub fn trigger(&mut self, id: TargetId, now_ms: f64) -> bool {
        let Some(target) = self.target_mut(id) else {
            return false;
        };
        if target.start(now_ms) {
            debug!("counter {:?} started at {now_ms}ms", target.handle);
            self.pending_events.push(CounterEvent::Started {
                target: id,
                at_ms: now_ms,
            });
            true
        } else {
            trace!("ignoring repeated trigger for {:?}", target.handle);
            false
        }
    }

    /// Abort a running counter whose element is gone. The last written frame stays.
    pub fn detach(&mut self, id: TargetId) -> bool {
        let Some(target) = self.target_mut(id) else {
            return false;
        };
        if target.abort() {
            debug!("counter {:?} detached mid-animation", target.handle);
            self.pending_events.push(CounterEvent::Detached { target: id });
            true
        } else {
            false
        }
    }

    /// Apply visibility inputs, then render one frame for every running counter.
    ///
    /// The returned outputs also carry events raised by `trigger`/`detach` since
    /// the previous update.
    pub fn update(&mut self, now_ms: f64, inputs: Inputs) -> &Outputs {
        self.outputs.clear();

        // 1) Visibility: the marker is set before any frame is rendered.
        for ev in inputs.visibility {
            self.apply_visibility(ev, now_ms);
        }
        for ev in self.pending_events.drain(..) {
            self.outputs.push_event(ev);
        }

        // 2) Advance running counters
        let mut running = 0;
        for target in self.targets.iter_mut() {
            let Some((text, done)) = target.advance(now_ms) else {
                continue;
            };
            self.outputs.push_change(Change {
                target: target.id,
                handle: target.handle.clone(),
                text,
            });
            if done {
                self.outputs.push_event(CounterEvent::Completed {
                    target: target.id,
                    value: target.target_value,
                });
            } else {
                running += 1;
            }
        }
        self.outputs.running = running;
        &self.outputs
    }

    /// Render the exact final frame of every running counter and complete it.
    ///
    /// Used at teardown: no further ticks will come, so the element must not
    /// keep a partial value.
    pub fn finish_running(&mut self) -> &Outputs {
        self.outputs.clear();
        for ev in self.pending_events.drain(..) {
            self.outputs.push_event(ev);
        }
        for target in self.targets.iter_mut() {
            let Some(text) = target.finish() else {
                continue;
            };
            self.outputs.push_change(Change {
                target: target.id,
                handle: target.handle.clone(),
                text,
            });
            self.outputs.push_event(CounterEvent::Completed {
                target: target.id,
                value: target.target_value,
            });
        }
        &self.outputs
    }

    fn apply_visibility(&mut self, ev: VisibilityEvent, now_ms: f64) {
        let Some(target) = self.target(ev.target) else {
            trace!("visibility for unknown counter {:?}", ev.target);
            return;
        };
        if !ev.meets(target.config.threshold) {
            return;
        }
        self.trigger(ev.target, now_ms);
    }

    #[inline]
    fn target_mut(&mut self, id: TargetId) -> Option<&mut CounterTarget> {
        // Ids are dense indices allocated in push order.
        self.targets
            .get_mut(id.0 as usize)
            .filter(|t| t.id == id)
    }

    #[inline]
    pub fn target(&self, id: TargetId) -> Option<&CounterTarget> {
        self.targets.get(id.0 as usize).filter(|t| t.id == id)
    }

    pub fn state(&self, id: TargetId) -> Option<AnimationState> {
        self.target(id).map(|t| t.state())
    }

    pub fn find_by_handle(&self, handle: &str) -> Option<TargetId> {
        self.targets
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.id)
    }

    pub fn targets(&self) -> impl Iterator<Item = &CounterTarget> {
        self.targets.iter()
    }

    pub fn running_count(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| t.state() == AnimationState::Running)
            .count()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
