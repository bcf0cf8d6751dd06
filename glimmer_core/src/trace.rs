// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for controller lifecycles and frame loops.
//!
//! This module provides a [`TraceSink`] trait with one method per event.
//! All method bodies default to no-ops, so implementing only the events you
//! care about is fine.
//!
//! [`Tracer`] wraps an optional shared sink and is carried by every
//! [`Environment`](crate::host::Environment). When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies.

#[cfg(feature = "trace")]
use alloc::rc::Rc;
#[cfg(feature = "trace")]
use core::cell::RefCell;

use crate::fade::FadePhase;
use crate::parallax::Suppression;
use crate::time::Duration;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which controller owns a frame loop or handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerKind {
    /// [`FadeController`](crate::fade::FadeController).
    Fade,
    /// [`ParallaxController`](crate::parallax::ParallaxController).
    Parallax,
    /// [`MovingBorderAnimator`](crate::border::MovingBorderAnimator).
    MovingBorder,
}

/// What happened to a frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopAction {
    /// The loop registered its first frame.
    Started,
    /// The loop was cancelled.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted on every fade state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FadePhaseEvent {
    /// Phase before the transition.
    pub from: FadePhase,
    /// Phase after the transition.
    pub to: FadePhase,
}

/// Emitted when a controller starts or cancels its frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopEvent {
    /// Controller owning the loop.
    pub kind: ControllerKind,
    /// What happened.
    pub action: LoopAction,
}

/// Emitted once per parallax frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxFrameEvent {
    /// Frame counter of the owning loop.
    pub frame_index: u64,
    /// Scroll offset sampled this frame.
    pub scroll_y: f64,
    /// Published translate-Y.
    pub offset_y: f64,
    /// Why the identity transform was published, if it was.
    pub suppressed: Option<Suppression>,
}

/// Emitted when the moving border accepts new element geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderGeometryEvent {
    /// Element width.
    pub width: f64,
    /// Element height.
    pub height: f64,
    /// Perimeter of the pill outline.
    pub path_length: f64,
}

/// Emitted once per moving-border frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderFrameEvent {
    /// Frame counter of the owning loop.
    pub frame_index: u64,
    /// Time since the loop's first frame.
    pub elapsed: Duration,
    /// Published dash offset.
    pub dash_offset: f64,
}

/// Emitted when a mount resolves to an inert handle because the host lacks
/// the required APIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InertMountEvent {
    /// Controller that was mounted.
    pub kind: ControllerKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives diagnostic events from controllers.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called on every fade state transition.
    fn on_fade_phase(&mut self, e: &FadePhaseEvent) {
        _ = e;
    }

    /// Called when a frame loop starts or is cancelled.
    fn on_loop(&mut self, e: &LoopEvent) {
        _ = e;
    }

    /// Called once per parallax frame.
    fn on_parallax_frame(&mut self, e: &ParallaxFrameEvent) {
        _ = e;
    }

    /// Called when the moving border accepts new geometry.
    fn on_border_geometry(&mut self, e: &BorderGeometryEvent) {
        _ = e;
    }

    /// Called once per moving-border frame.
    fn on_border_frame(&mut self, e: &BorderFrameEvent) {
        _ = e;
    }

    /// Called when a mount resolves to an inert handle.
    fn on_inert_mount(&mut self, e: &InertMountEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Shared handle to a sink, as accepted by [`Tracer::new`].
#[cfg(feature = "trace")]
pub type SharedSink = Rc<RefCell<dyn TraceSink>>;

/// Thin, cloneable wrapper around an optional shared [`TraceSink`].
///
/// Events emitted while the sink is already borrowed (a sink that re-enters
/// a controller) are dropped.
#[derive(Clone, Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<SharedSink>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(sink) = &$self.sink
            && let Ok(mut sink) = sink.try_borrow_mut()
        {
            sink.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[cfg(feature = "trace")]
    #[inline]
    #[must_use]
    pub fn new(sink: SharedSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Emits a [`FadePhaseEvent`].
    #[inline]
    pub fn fade_phase(&self, e: &FadePhaseEvent) {
        dispatch!(self, on_fade_phase, e);
    }

    /// Emits a [`LoopEvent`].
    #[inline]
    pub fn frame_loop(&self, e: &LoopEvent) {
        dispatch!(self, on_loop, e);
    }

    /// Emits a [`ParallaxFrameEvent`].
    #[inline]
    pub fn parallax_frame(&self, e: &ParallaxFrameEvent) {
        dispatch!(self, on_parallax_frame, e);
    }

    /// Emits a [`BorderGeometryEvent`].
    #[inline]
    pub fn border_geometry(&self, e: &BorderGeometryEvent) {
        dispatch!(self, on_border_geometry, e);
    }

    /// Emits a [`BorderFrameEvent`].
    #[inline]
    pub fn border_frame(&self, e: &BorderFrameEvent) {
        dispatch!(self, on_border_frame, e);
    }

    /// Emits an [`InertMountEvent`].
    #[inline]
    pub fn inert_mount(&self, e: &InertMountEvent) {
        dispatch!(self, on_inert_mount, e);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_fade_phase(&FadePhaseEvent {
            from: FadePhase::Pending,
            to: FadePhase::Visible,
        });
        sink.on_loop(&LoopEvent {
            kind: ControllerKind::Parallax,
            action: LoopAction::Started,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let tracer = Tracer::none();
        tracer.inert_mount(&InertMountEvent {
            kind: ControllerKind::Fade,
        });
        tracer.border_frame(&BorderFrameEvent {
            frame_index: 0,
            elapsed: Duration::ZERO,
            dash_offset: 0.0,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        #[derive(Default)]
        struct RecordingSink {
            loops: Vec<LoopEvent>,
        }
        impl TraceSink for RecordingSink {
            fn on_loop(&mut self, e: &LoopEvent) {
                self.loops.push(*e);
            }
        }

        let sink = Rc::new(RefCell::new(RecordingSink::default()));
        let tracer = Tracer::new(sink.clone());
        let event = LoopEvent {
            kind: ControllerKind::MovingBorder,
            action: LoopAction::Cancelled,
        };
        tracer.frame_loop(&event);
        assert_eq!(sink.borrow().loops, &[event]);
    }
}
