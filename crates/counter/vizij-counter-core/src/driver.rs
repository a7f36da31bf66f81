//! Driver: the single coordinator wiring an [`Engine`] to host capabilities.
//!
//! The host forwards two kinds of callbacks into the driver:
//! - visibility reports -> `handle_visibility`
//! - display-refresh ticks -> `on_frame`
//!
//! Each call reads the clock once, steps the engine, writes the resulting text
//! and asks the scheduler for another tick while any counter is running.
//!
//! The element marker is checked when a visibility report is dispatched, so two
//! counters sharing one element never both start.

use std::collections::HashMap;

use log::debug;

use crate::config::CounterConfig;
use crate::engine::Engine;
use crate::host::{Clock, FrameScheduler, ObserveOptions, Subscription, TextSurface, VisibilitySource};
use crate::ids::TargetId;
use crate::inputs::{Inputs, VisibilityEvent};
use crate::outputs::CounterEvent;
use crate::target::AnimationState;

#[derive(Debug)]
pub struct Driver<C, F, T, V> {
    engine: Engine,
    clock: C,
    scheduler: F,
    surface: T,
    visibility: V,
    subscriptions: HashMap<TargetId, Subscription>,
    frame_pending: bool,
    shut_down: bool,
}

impl<C, F, T, V> Driver<C, F, T, V>
where
    C: Clock,
    F: FrameScheduler,
    T: TextSurface,
    V: VisibilitySource,
{
    pub fn new(engine: Engine, clock: C, scheduler: F, surface: T, visibility: V) -> Self {
        Self {
            engine,
            clock,
            scheduler,
            surface,
            visibility,
            subscriptions: HashMap::new(),
            frame_pending: false,
            shut_down: false,
        }
    }

    /// Register the element behind `handle` with the engine defaults and start watching it.
    pub fn register(&mut self, handle: &str) -> Option<TargetId> {
        let cfg = self.engine.config().defaults.clone();
        self.register_with(handle, cfg)
    }

    /// Register with per-counter settings. `None` when the element is unusable; it is left untouched.
    pub fn register_with(&mut self, handle: &str, cfg: CounterConfig) -> Option<TargetId> {
        if self.shut_down {
            return None;
        }
        if self.surface.is_marked(handle) {
            debug!("counter {handle:?} already animated; skipping");
            return None;
        }
        let Some(text) = self.surface.read_source(handle, &cfg.source) else {
            debug!("counter {handle:?} has no readable value");
            return None;
        };
        let opts = ObserveOptions::from(&cfg);
        let id = self.engine.register_with(handle, &text, cfg)?;
        match self.visibility.observe(id, handle, &opts) {
            Some(sub) => {
                self.subscriptions.insert(id, sub);
            }
            None => debug!("counter {handle:?} could not be observed; it stays static"),
        }
        Some(id)
    }

    /// Page-load scan: register every handle, returning the ones that were accepted.
    pub fn register_all<'a, I>(&mut self, handles: I) -> Vec<TargetId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        handles
            .into_iter()
            .filter_map(|h| self.register(h))
            .collect()
    }

    /// Visibility callback entry point.
    pub fn handle_visibility(&mut self, events: &[VisibilityEvent]) {
        if self.shut_down || events.is_empty() {
            return;
        }
        let now = self.clock.now_ms();
        for ev in events {
            self.dispatch(ev, now);
        }
        self.step(now);
    }

    /// Display-refresh callback entry point.
    pub fn on_frame(&mut self) {
        self.frame_pending = false;
        if self.shut_down {
            return;
        }
        let now = self.clock.now_ms();
        self.step(now);
    }

    /// Disconnect every remaining subscription and settle running counters on
    /// their final value. Later callbacks are no-ops.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        for (_, sub) in self.subscriptions.drain() {
            self.visibility.unobserve(&sub);
        }
        let changes = self.engine.finish_running().changes.clone();
        for change in changes {
            if let Err(err) = self.surface.write_text(&change.handle, &change.text) {
                debug!("counter {:?} not settled: {err}", change.handle);
            }
        }
        for target in self.engine.targets() {
            self.surface.release(&target.handle);
        }
        self.shut_down = true;
    }

    /// Start the counter behind `ev`, unless its element already carries the marker.
    fn dispatch(&mut self, ev: &VisibilityEvent, now_ms: f64) {
        let Some(target) = self.engine.target(ev.target) else {
            return;
        };
        if target.state() != AnimationState::Idle || !ev.meets(target.config.threshold) {
            return;
        }
        let handle = target.handle.clone();
        if self.surface.is_marked(&handle) {
            debug!("counter {handle:?} shares an element that already animated; dropping it");
            if let Some(sub) = self.subscriptions.remove(&ev.target) {
                self.visibility.unobserve(&sub);
            }
            self.surface.release(&handle);
            return;
        }
        // Marked before the first frame so another counter on the same element sees it.
        if self.engine.trigger(ev.target, now_ms) {
            self.surface.mark_animated(&handle);
        }
    }

    fn step(&mut self, now_ms: f64) {
        let out = self.engine.update(now_ms, Inputs::default());
        let mut started = Vec::new();
        let mut finished = Vec::new();
        for ev in &out.events {
            match ev {
                CounterEvent::Started { target, .. } => started.push(*target),
                CounterEvent::Completed { target, .. } => finished.push(*target),
                _ => {}
            }
        }
        let changes = out.changes.clone();

        // One-shot: the subscription goes away with the first frame.
        for id in started {
            if let Some(sub) = self.subscriptions.remove(&id) {
                self.visibility.unobserve(&sub);
            }
        }

        for change in changes {
            if let Err(err) = self.surface.write_text(&change.handle, &change.text) {
                debug!("aborting counter {:?}: {err}", change.handle);
                self.engine.detach(change.target);
                self.surface.release(&change.handle);
            }
        }

        for id in finished {
            if let Some(target) = self.engine.target(id) {
                self.surface.release(&target.handle);
            }
        }

        let running = self.engine.running_count();
        if running > 0 && !self.frame_pending {
            self.frame_pending = self.scheduler.request_frame();
            if !self.frame_pending {
                debug!("no frame scheduled; {running} counters wait for the next callback");
            }
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    pub fn surface(&self) -> &T {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut T {
        &mut self.surface
    }

    pub fn visibility(&self) -> &V {
        &self.visibility
    }

    pub fn visibility_mut(&mut self) -> &mut V {
        &mut self.visibility
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
