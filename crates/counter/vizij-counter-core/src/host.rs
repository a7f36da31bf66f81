//! Host capabilities injected into the [`Driver`](crate::Driver).
//!
//! Adapters (wasm, tests) implement these over their environment: a clock, a
//! "run before the next repaint" scheduler, the element text surface and a
//! visibility source with unsubscribe handles.

use std::cell::Cell;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::{CounterConfig, ValueSource};
use crate::error::CounterError;
use crate::ids::{SubscriptionId, TargetId};

/// Monotonic milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Display-refresh scheduler. The host calls `Driver::on_frame` when the frame fires.
pub trait FrameScheduler {
    /// Ask for one tick. `false` if no tick will come.
    fn request_frame(&mut self) -> bool;
}

/// Element text/content surface, keyed by host handle.
pub trait TextSurface {
    /// Read the initial value text (element text or a named attribute).
    fn read_source(&self, handle: &str, source: &ValueSource) -> Option<String>;

    /// Write one frame. `CounterError::Detached` if the element is gone.
    fn write_text(&mut self, handle: &str, text: &str) -> Result<(), CounterError>;

    /// Persist the "already animated" marker on the element itself.
    fn mark_animated(&mut self, _handle: &str) {}

    /// Whether the element already carries the marker (e.g. from an earlier scan).
    fn is_marked(&self, _handle: &str) -> bool {
        false
    }

    /// The counter behind `handle` is finished with its element; drop any reference to it.
    fn release(&mut self, _handle: &str) {}
}

/// Options a visibility source needs to watch one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObserveOptions {
    pub threshold: f32,
    pub root_margin: String,
}

impl From<&CounterConfig> for ObserveOptions {
    fn from(cfg: &CounterConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            root_margin: cfg.root_margin.clone(),
        }
    }
}

/// Handle returned by `VisibilitySource::observe`; pass back to `unobserve`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub target: TargetId,
    pub handle: String,
}

/// Source of `(element, isIntersecting)` reports.
///
/// Reports are delivered back to the driver through `Driver::handle_visibility`.
pub trait VisibilitySource {
    fn observe(
        &mut self,
        target: TargetId,
        handle: &str,
        opts: &ObserveOptions,
    ) -> Option<Subscription>;

    fn unobserve(&mut self, sub: &Subscription);
}

/// Hand-driven clock for deterministic stepping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, dt_ms: f64) {
        self.now.set(self.now.get() + dt_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

/// Wall clock for native hosts, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_steps() {
        let clock = ManualClock::new(10.0);
        clock.advance(16.5);
        assert_eq!(clock.now_ms(), 26.5);
        clock.set(0.0);
        assert_eq!((&clock).now_ms(), 0.0);
    }

    #[test]
    fn observe_options_follow_config() {
        let opts = ObserveOptions::from(&CounterConfig::stat_card());
        assert_eq!(opts.threshold, 0.5);
        assert_eq!(opts.root_margin, "0px 0px -100px 0px");
    }
}
