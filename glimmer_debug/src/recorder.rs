// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event, stamped
//! with the time it arrived, for later inspection or export with
//! [`chrome::export`](crate::chrome::export).

use std::time::Instant;

use glimmer_core::time::HostTime;
use glimmer_core::trace::{
    BorderFrameEvent, BorderGeometryEvent, FadePhaseEvent, InertMountEvent, LoopEvent,
    ParallaxFrameEvent, TraceSink,
};

/// One recorded event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedEvent {
    /// See [`TraceSink::on_fade_phase`].
    FadePhase(FadePhaseEvent),
    /// See [`TraceSink::on_loop`].
    Loop(LoopEvent),
    /// See [`TraceSink::on_parallax_frame`].
    ParallaxFrame(ParallaxFrameEvent),
    /// See [`TraceSink::on_border_geometry`].
    BorderGeometry(BorderGeometryEvent),
    /// See [`TraceSink::on_border_frame`].
    BorderFrame(BorderFrameEvent),
    /// See [`TraceSink::on_inert_mount`].
    InertMount(InertMountEvent),
}

/// A recorded event and its arrival time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stamped {
    /// Arrival time.
    pub at: HostTime,
    /// The event.
    pub event: RecordedEvent,
}

/// A [`TraceSink`] that keeps every event in memory.
pub struct RecorderSink {
    clock: Box<dyn FnMut() -> HostTime>,
    events: Vec<Stamped>,
}

impl std::fmt::Debug for RecorderSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderSink")
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates a recorder stamping events with wall-clock time since its
    /// creation.
    #[must_use]
    pub fn new() -> Self {
        let origin = Instant::now();
        Self::with_clock(move || {
            let us = origin.elapsed().as_micros();
            HostTime(u64::try_from(us).unwrap_or(u64::MAX))
        })
    }

    /// Creates a recorder stamping events with `clock`, such as a simulated
    /// host's `now`.
    #[must_use]
    pub fn with_clock(clock: impl FnMut() -> HostTime + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            events: Vec::new(),
        }
    }

    /// Returns the recorded events in arrival order.
    #[must_use]
    pub fn events(&self) -> &[Stamped] {
        &self.events
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<Stamped> {
        self.events
    }

    /// Drops every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn push(&mut self, event: RecordedEvent) {
        let at = (self.clock)();
        self.events.push(Stamped { at, event });
    }
}

impl TraceSink for RecorderSink {
    fn on_fade_phase(&mut self, e: &FadePhaseEvent) {
        self.push(RecordedEvent::FadePhase(*e));
    }

    fn on_loop(&mut self, e: &LoopEvent) {
        self.push(RecordedEvent::Loop(*e));
    }

    fn on_parallax_frame(&mut self, e: &ParallaxFrameEvent) {
        self.push(RecordedEvent::ParallaxFrame(*e));
    }

    fn on_border_geometry(&mut self, e: &BorderGeometryEvent) {
        self.push(RecordedEvent::BorderGeometry(*e));
    }

    fn on_border_frame(&mut self, e: &BorderFrameEvent) {
        self.push(RecordedEvent::BorderFrame(*e));
    }

    fn on_inert_mount(&mut self, e: &InertMountEvent) {
        self.push(RecordedEvent::InertMount(*e));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glimmer_core::fade::{FadeController, FadeOptions, FadePhase};
    use glimmer_core::host::Environment;
    use glimmer_core::parallax::{ParallaxController, ParallaxOptions};
    use glimmer_core::sim::SimHost;
    use glimmer_core::trace::{ControllerKind, LoopAction, Tracer};
    use kurbo::Size;

    use super::*;

    fn traced(host: &SimHost) -> (Environment<glimmer_core::sim::SimElement>, Rc<RefCell<RecorderSink>>) {
        let clock = host.clone();
        let sink = Rc::new(RefCell::new(RecorderSink::with_clock(move || clock.now())));
        let env = host.environment().with_tracer(Tracer::new(sink.clone()));
        (env, sink)
    }

    #[test]
    fn records_fade_transitions() {
        let host = SimHost::new();
        let (env, sink) = traced(&host);
        let element = host.create_element(Size::new(10.0, 10.0));
        let _handle = FadeController::mount(&env, &element, FadeOptions::new().with_delay_ms(200));
        host.layout();
        host.set_visible_ratio(element, 1.0);
        host.advance_ms(200);

        let phases: Vec<_> = sink
            .borrow()
            .events()
            .iter()
            .filter_map(|s| match s.event {
                RecordedEvent::FadePhase(e) => Some((s.at, e.to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            [
                (HostTime(0), FadePhase::Waiting),
                (HostTime::from_millis(200), FadePhase::Visible),
            ]
        );
    }

    #[test]
    fn records_loop_lifecycle_and_frames() {
        let host = SimHost::new();
        host.set_scroll_y(100.0);
        let (env, sink) = traced(&host);
        let handle = ParallaxController::mount(&env, ParallaxOptions::new());
        host.run_frames(3);
        drop(handle);

        let sink = sink.borrow();
        let loops: Vec<_> = sink
            .events()
            .iter()
            .filter_map(|s| match s.event {
                RecordedEvent::Loop(e) => Some(e),
                _ => None,
            })
            .collect();
        assert_eq!(loops.len(), 2, "started and cancelled");
        assert_eq!(loops[0].kind, ControllerKind::Parallax);
        assert_eq!(loops[0].action, LoopAction::Started);
        assert_eq!(loops[1].action, LoopAction::Cancelled);

        let frames = sink
            .events()
            .iter()
            .filter(|s| matches!(s.event, RecordedEvent::ParallaxFrame(_)))
            .count();
        assert_eq!(frames, 3);
    }
}
