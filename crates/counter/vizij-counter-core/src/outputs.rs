//! Output contracts from the counter engine.
//!
//! Outputs carry the text to write this tick, keyed by the host handle, plus a
//! separate list of lifecycle events. Hosts apply changes to their elements.

use serde::{Deserialize, Serialize};

use crate::ids::TargetId;

/// Text to write into one element this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub target: TargetId,
    pub handle: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CounterEvent {
    Started { target: TargetId, at_ms: f64 },
    Completed { target: TargetId, value: u64 },
    Detached { target: TargetId },
}

/// Outputs returned by Engine::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<CounterEvent>,
    /// Counters still running after this tick.
    #[serde(default)]
    pub running: usize,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
        self.running = 0;
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: CounterEvent) {
        self.events.push(event);
    }

    /// Whether the host should schedule another display-refresh tick.
    #[inline]
    pub fn needs_frame(&self) -> bool {
        self.running > 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }
}
