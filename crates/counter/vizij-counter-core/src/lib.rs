//! Vizij Counter Core (host-agnostic)
//!
//! Animates integer counters (`"85%"`, `"50+"`, `"1200"`) from zero up to their
//! declared value once their element scrolls into view. The crate owns parsing,
//! easing, the per-target `Idle -> Running -> Completed` state machine and the
//! frame math. Hosts (the wasm adapter, tests) plug in a clock, a frame
//! scheduler, a text surface and a visibility source through the traits in
//! [`host`], and drive everything through a single [`Driver`].

pub mod config;
pub mod driver;
pub mod easing;
pub mod engine;
pub mod error;
pub mod host;
pub mod ids;
pub mod inputs;
pub mod outputs;
pub mod parse;
pub mod target;

// Re-exports for consumers (adapters)
pub use config::{Config, CounterConfig, DigitRun, ValueSource};
pub use driver::Driver;
pub use easing::Easing;
pub use engine::Engine;
pub use error::CounterError;
pub use host::{
    Clock, FrameScheduler, ManualClock, ObserveOptions, Subscription, SystemClock, TextSurface,
    VisibilitySource,
};
pub use ids::{SubscriptionId, TargetId};
pub use inputs::{Inputs, VisibilityEvent};
pub use outputs::{Change, CounterEvent, Outputs};
pub use parse::{format_display, parse_counter_text, DisplayFormat, ParsedCounter};
pub use target::{frame_value, AnimationState, CompletionKind, CounterTarget};
