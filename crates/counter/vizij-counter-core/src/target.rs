//! Per-element counter state and frame math.

use serde::{Deserialize, Serialize};

use crate::config::CounterConfig;
use crate::easing::Easing;
use crate::ids::TargetId;
use crate::parse::{format_display, DisplayFormat};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    #[default]
    Idle,
    Running,
    Completed,
}

impl AnimationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Running => "running",
            AnimationState::Completed => "completed",
        }
    }
}

/// How a Completed target got there.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    /// Final frame showed the exact target value.
    Finished,
    /// The host element went away mid-animation.
    Detached,
}

/// One counter bound to one host element.
#[derive(Clone, Debug)]
pub struct CounterTarget {
    pub id: TargetId,
    pub handle: String,
    pub target_value: u64,
    pub format: DisplayFormat,
    pub config: CounterConfig,
    state: AnimationState,
    /// Set once, when the visibility trigger is accepted.
    animated: bool,
    started_at_ms: Option<f64>,
    last_elapsed_ms: f64,
    outcome: Option<CompletionKind>,
}

impl CounterTarget {
    pub(crate) fn new(
        id: TargetId,
        handle: String,
        target_value: u64,
        format: DisplayFormat,
        config: CounterConfig,
    ) -> Self {
        Self {
            id,
            handle,
            target_value,
            format,
            config,
            state: AnimationState::Idle,
            animated: false,
            started_at_ms: None,
            last_elapsed_ms: 0.0,
            outcome: None,
        }
    }

    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        self.animated
    }

    #[inline]
    pub fn started_at_ms(&self) -> Option<f64> {
        self.started_at_ms
    }

    #[inline]
    pub fn outcome(&self) -> Option<CompletionKind> {
        self.outcome
    }

    /// Idle -> Running. Returns false if the marker is already set.
    pub(crate) fn start(&mut self, now_ms: f64) -> bool {
        if self.animated {
            return false;
        }
        self.animated = true;
        self.state = AnimationState::Running;
        self.started_at_ms = Some(now_ms);
        true
    }

    /// Render the frame for `now_ms`. Returns the text and whether this was the final frame.
    pub(crate) fn advance(&mut self, now_ms: f64) -> Option<(String, bool)> {
        if self.state != AnimationState::Running {
            return None;
        }
        let start = self.started_at_ms?;
        let elapsed = (now_ms - start).max(self.last_elapsed_ms);
        self.last_elapsed_ms = elapsed;

        let (value, done) = frame_value(
            self.target_value,
            elapsed,
            self.config.duration_ms,
            &self.config.easing,
        );
        if done {
            self.state = AnimationState::Completed;
            self.outcome = Some(CompletionKind::Finished);
        }
        Some((format_display(value, self.format), done))
    }

    /// Running -> Completed at the exact target. Returns the final text.
    pub(crate) fn finish(&mut self) -> Option<String> {
        if self.state != AnimationState::Running {
            return None;
        }
        self.state = AnimationState::Completed;
        self.outcome = Some(CompletionKind::Finished);
        Some(format_display(self.target_value, self.format))
    }

    pub(crate) fn abort(&mut self) -> bool {
        if self.state != AnimationState::Running {
            return false;
        }
        // The marker stays set so a detached target never restarts.
        self.state = AnimationState::Completed;
        self.outcome = Some(CompletionKind::Detached);
        true
    }
}

/// Value displayed after `elapsed_ms` of a `duration_ms` animation towards `target`.
///
/// Once progress reaches 1 the exact target is returned, never a rounded-down
/// approximation.
pub fn frame_value(target: u64, elapsed_ms: f64, duration_ms: f64, easing: &Easing) -> (u64, bool) {
    let progress = if duration_ms > 0.0 {
        (elapsed_ms / duration_ms).clamp(0.0, 1.0)
    } else {
        1.0
    };
    if progress >= 1.0 {
        return (target, true);
    }
    let eased = easing.apply(progress);
    let current = (target as f64 * eased).floor() as u64;
    (current.min(target), false)
}
