// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host capability ports.
//!
//! Controllers never reach for global browser state. Each host capability
//! they consume is a small trait with one concern, and an [`Environment`]
//! bundles one implementation of each:
//!
//! - [`FrameScheduler`] — one-shot per-frame callbacks
//!   (`requestAnimationFrame`).
//! - [`TimerScheduler`] — one-shot delayed callbacks (`setTimeout`).
//! - [`MotionPreference`] — the reduced-motion accessibility setting.
//! - [`ScrollSource`] — the global vertical scroll offset.
//! - [`ViewportSource`] — the current viewport width.
//! - [`ResizeSource`] — element box-size change notifications
//!   (`ResizeObserver`).
//! - [`IntersectionSource`] — element/viewport intersection notifications
//!   (`IntersectionObserver`).
//!
//! # Crate boundaries
//!
//! `glimmer_core` owns these traits and the controllers built on them.
//! Backend crates (e.g. `glimmer_backend_web`) implement them against a
//! real host; [`sim::SimHost`](crate::sim::SimHost) implements them against a
//! manually advanced virtual clock for tests.
//!
//! # Callback re-entrancy
//!
//! Hosts must not invoke a callback synchronously from inside the call that
//! registered it. Callbacks may call back into the host (e.g. request the
//! next frame, or unobserve from inside an observer callback).

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use kurbo::Size;

use crate::time::{Duration, HostTime};
use crate::trace::Tracer;

/// Identifies a pending frame request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub u64);

/// Identifies a pending timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Identifies an active resize or intersection observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// A one-shot frame callback, receiving the frame timestamp.
pub type FrameCallback = Box<dyn FnOnce(HostTime)>;

/// The host's animation-frame primitive.
pub trait FrameScheduler {
    /// Requests that `callback` run once, before the next repaint.
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Cancels a pending request. Unknown or already-fired ids are ignored.
    fn cancel_frame(&self, id: FrameRequestId);
}

/// The host's delayed-callback primitive.
pub trait TimerScheduler {
    /// Runs `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Clears a pending timer. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

/// The user's reduced-motion preference.
///
/// Implementations must read the live setting on every call; the user can
/// change it while the page is open.
pub trait MotionPreference {
    /// Returns `true` if the user asked for minimal motion.
    fn prefers_reduced_motion(&self) -> bool;
}

/// The global vertical scroll offset, in device-independent pixels.
pub trait ScrollSource {
    /// Returns the current vertical scroll offset.
    fn scroll_y(&self) -> f64;
}

/// The current viewport width, in device-independent pixels.
pub trait ViewportSource {
    /// Returns the current viewport width.
    fn viewport_width(&self) -> f64;
}

/// Element box-size change notifications.
pub trait ResizeSource<E> {
    /// Starts observing `element`, calling `callback` with its box size after
    /// the first layout pass and after every size change.
    ///
    /// Returns `None` if `element` is detached; nothing is registered then.
    fn observe_size(&self, element: &E, callback: Box<dyn FnMut(Size)>) -> Option<ObserverId>;

    /// Stops an observation. Unknown ids are ignored.
    fn unobserve_size(&self, id: ObserverId);
}

/// Parameters for an intersection observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionOptions {
    /// Visible fraction (0–1) at which the host reports a crossing.
    pub threshold: f64,
    /// Bottom margin applied to the viewport, in pixels. Negative values
    /// shrink the viewport so crossings fire before the element is fully in
    /// view.
    pub bottom_margin_px: f64,
}

/// One intersection report for an observed element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEntry {
    /// Whether the element currently intersects the (margin-adjusted)
    /// viewport.
    pub is_intersecting: bool,
    /// Visible fraction of the element, 0–1.
    pub ratio: f64,
}

/// Element/viewport intersection notifications.
pub trait IntersectionSource<E> {
    /// Starts observing `element`, calling `callback` each time its visible
    /// fraction crosses `options.threshold`.
    ///
    /// Returns `None` if `element` is detached; nothing is registered then.
    fn observe_intersection(
        &self,
        element: &E,
        options: IntersectionOptions,
        callback: Box<dyn FnMut(IntersectionEntry)>,
    ) -> Option<ObserverId>;

    /// Stops an observation. Unknown ids are ignored.
    fn unobserve_intersection(&self, id: ObserverId);
}

/// The host capabilities available to controllers.
///
/// `E` is the host's element handle type. Cloning is cheap; every port is
/// reference counted.
pub struct Environment<E> {
    /// Per-frame callbacks.
    pub frames: Rc<dyn FrameScheduler>,
    /// Delayed callbacks.
    pub timers: Rc<dyn TimerScheduler>,
    /// Reduced-motion preference.
    pub motion: Rc<dyn MotionPreference>,
    /// Vertical scroll offset.
    pub scroll: Rc<dyn ScrollSource>,
    /// Viewport width.
    pub viewport: Rc<dyn ViewportSource>,
    /// Element size observation.
    pub resize: Rc<dyn ResizeSource<E>>,
    /// Element visibility observation.
    pub intersection: Rc<dyn IntersectionSource<E>>,
    /// Diagnostics hook.
    pub tracer: Tracer,
    available: bool,
}

impl<E: 'static> Environment<E> {
    /// Creates an available environment from the given ports.
    #[must_use]
    pub fn new(
        frames: Rc<dyn FrameScheduler>,
        timers: Rc<dyn TimerScheduler>,
        motion: Rc<dyn MotionPreference>,
        scroll: Rc<dyn ScrollSource>,
        viewport: Rc<dyn ViewportSource>,
        resize: Rc<dyn ResizeSource<E>>,
        intersection: Rc<dyn IntersectionSource<E>>,
    ) -> Self {
        Self {
            frames,
            timers,
            motion,
            scroll,
            viewport,
            resize,
            intersection,
            tracer: Tracer::none(),
            available: true,
        }
    }

    /// Creates an environment for hosts without frame, viewport, or observer
    /// APIs (e.g. server-side rendering).
    ///
    /// Every mount against it yields an inert handle.
    #[must_use]
    pub fn unavailable() -> Self {
        let host = Rc::new(NullHost);
        Self {
            frames: host.clone(),
            timers: host.clone(),
            motion: host.clone(),
            scroll: host.clone(),
            viewport: host.clone(),
            resize: host.clone(),
            intersection: host,
            tracer: Tracer::none(),
            available: false,
        }
    }

    /// Replaces the diagnostics hook.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }
}

impl<E> Environment<E> {
    /// Returns `false` if the host lacks the APIs controllers need.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Reads the live reduced-motion preference.
    ///
    /// Always `false` for an unavailable environment.
    #[must_use]
    pub fn prefers_reduced_motion(&self) -> bool {
        self.available && self.motion.prefers_reduced_motion()
    }
}

impl<E> Clone for Environment<E> {
    fn clone(&self) -> Self {
        Self {
            frames: Rc::clone(&self.frames),
            timers: Rc::clone(&self.timers),
            motion: Rc::clone(&self.motion),
            scroll: Rc::clone(&self.scroll),
            viewport: Rc::clone(&self.viewport),
            resize: Rc::clone(&self.resize),
            intersection: Rc::clone(&self.intersection),
            tracer: self.tracer.clone(),
            available: self.available,
        }
    }
}

impl<E> fmt::Debug for Environment<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("available", &self.available)
            .finish_non_exhaustive()
    }
}

/// Backs [`Environment::unavailable`]: registers nothing, reports nothing.
struct NullHost;

impl FrameScheduler for NullHost {
    fn request_frame(&self, _callback: FrameCallback) -> FrameRequestId {
        FrameRequestId(0)
    }

    fn cancel_frame(&self, _id: FrameRequestId) {}
}

impl TimerScheduler for NullHost {
    fn set_timeout(&self, _delay: Duration, _callback: Box<dyn FnOnce()>) -> TimerId {
        TimerId(0)
    }

    fn clear_timeout(&self, _id: TimerId) {}
}

impl MotionPreference for NullHost {
    fn prefers_reduced_motion(&self) -> bool {
        false
    }
}

impl ScrollSource for NullHost {
    fn scroll_y(&self) -> f64 {
        0.0
    }
}

impl ViewportSource for NullHost {
    fn viewport_width(&self) -> f64 {
        0.0
    }
}

impl<E> ResizeSource<E> for NullHost {
    fn observe_size(&self, _element: &E, _callback: Box<dyn FnMut(Size)>) -> Option<ObserverId> {
        None
    }

    fn unobserve_size(&self, _id: ObserverId) {}
}

impl<E> IntersectionSource<E> for NullHost {
    fn observe_intersection(
        &self,
        _element: &E,
        _options: IntersectionOptions,
        _callback: Box<dyn FnMut(IntersectionEntry)>,
    ) -> Option<ObserverId> {
        None
    }

    fn unobserve_intersection(&self, _id: ObserverId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_environment_reports_nothing() {
        let env = Environment::<u32>::unavailable();
        assert!(!env.is_available());
        assert!(!env.prefers_reduced_motion());
        assert_eq!(env.resize.observe_size(&7, Box::new(|_| {})), None);
        let options = IntersectionOptions {
            threshold: 0.5,
            bottom_margin_px: 0.0,
        };
        assert_eq!(
            env.intersection
                .observe_intersection(&7, options, Box::new(|_| {})),
            None
        );
    }
}
