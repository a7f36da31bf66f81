//! Input contracts for the counter engine.
//!
//! Hosts collect visibility notifications between frames and pass them into
//! Engine::update() together with the current clock reading.

use serde::{Deserialize, Serialize};

use crate::ids::TargetId;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Inputs {
    /// Visibility changes applied before stepping running counters.
    #[serde(default)]
    pub visibility: Vec<VisibilityEvent>,
}

impl Inputs {
    pub fn visible(target: TargetId) -> Self {
        Self {
            visibility: vec![VisibilityEvent::visible(target)],
        }
    }
}

/// One `(element, isIntersecting)` report from the visibility source.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VisibilityEvent {
    pub target: TargetId,
    pub is_intersecting: bool,
    /// Visible fraction of the element's bounding box.
    #[serde(default = "full_ratio")]
    pub ratio: f32,
}

fn full_ratio() -> f32 {
    1.0
}

impl VisibilityEvent {
    pub fn visible(target: TargetId) -> Self {
        Self {
            target,
            is_intersecting: true,
            ratio: 1.0,
        }
    }

    /// Whether this report starts a counter watching at `threshold`.
    #[inline]
    pub fn meets(&self, threshold: f32) -> bool {
        self.is_intersecting && self.ratio >= threshold
    }

    pub fn hidden(target: TargetId) -> Self {
        Self {
            target,
            is_intersecting: false,
            ratio: 0.0,
        }
    }
}
