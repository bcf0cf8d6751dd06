// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll-linked parallax.
//!
//! Once per frame a [`ParallaxController`] reads the global scroll offset and
//! publishes `translate3d(0, scroll_y * speed, 0)`. Scroll events themselves
//! are never observed: the frame loop samples the latest value, so any number
//! of scroll events between two frames cost one update.
//!
//! The published value is a pure function of `(scroll_y, speed)` and the two
//! guards in [`ParallaxTransform::sample`]; there is no easing, so replaying
//! a scroll trace reproduces the same offsets.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::clock::{FrameClock, FrameLoop, FrameTick};
use crate::host::{Environment, MotionPreference, ScrollSource, ViewportSource};
use crate::trace::{
    ControllerKind, InertMountEvent, LoopAction, LoopEvent, ParallaxFrameEvent, Tracer,
};

/// Viewports narrower than this never receive parallax.
pub const PARALLAX_MIN_VIEWPORT_WIDTH: f64 = 1024.0;

/// Why a parallax frame published the identity transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Suppression {
    /// The caller mounted with `disabled = true`.
    Disabled,
    /// The user prefers reduced motion.
    ReducedMotion,
    /// The viewport is below [`PARALLAX_MIN_VIEWPORT_WIDTH`].
    NarrowViewport,
    /// The host has no scroll or viewport APIs.
    Unavailable,
}

/// Compositor hint for the parallax element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WillChange {
    /// No hint.
    #[default]
    Auto,
    /// The transform changes every frame.
    Transform,
}

impl WillChange {
    /// CSS `will-change` keyword.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Transform => "transform",
        }
    }
}

/// Options for [`ParallaxController::mount`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxOptions {
    /// Fraction of the scroll offset applied as translate-Y, 0–1.
    pub speed: f64,
    /// Always publish the identity transform.
    pub disabled: bool,
}

impl Default for ParallaxOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallaxOptions {
    /// Default options: speed 0.5, enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            speed: 0.5,
            disabled: false,
        }
    }

    /// Sets the speed factor.
    #[must_use]
    pub const fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Disables the effect.
    #[must_use]
    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Returns a copy with `speed` clamped to `[0, 1]`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.speed = if self.speed.is_nan() {
            Self::new().speed
        } else {
            self.speed.clamp(0.0, 1.0)
        };
        self
    }
}

/// The transform published for the parallax element.
///
/// Only the Y component of the translation is ever non-zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxTransform {
    /// Translate-Y in pixels.
    pub translate_y: f64,
    /// Compositor hint.
    pub will_change: WillChange,
    /// Set when a guard forced the identity transform.
    pub suppressed: Option<Suppression>,
}

impl ParallaxTransform {
    /// Identity transform, published for the given reason.
    #[must_use]
    pub const fn identity(reason: Suppression) -> Self {
        Self {
            translate_y: 0.0,
            will_change: WillChange::Auto,
            suppressed: Some(reason),
        }
    }

    /// Computes the transform for one frame.
    ///
    /// The guards run in order: reduced motion, then viewport width.
    #[must_use]
    pub fn sample(scroll_y: f64, speed: f64, viewport_width: f64, reduced_motion: bool) -> Self {
        if reduced_motion {
            return Self::identity(Suppression::ReducedMotion);
        }
        if viewport_width.is_nan() || viewport_width < PARALLAX_MIN_VIEWPORT_WIDTH {
            return Self::identity(Suppression::NarrowViewport);
        }
        let translate_y = if scroll_y.is_finite() { scroll_y * speed } else { 0.0 };
        Self {
            translate_y,
            will_change: WillChange::Transform,
            suppressed: None,
        }
    }

    /// The full translation as `(x, y, z)`.
    #[must_use]
    pub const fn translation(&self) -> (f64, f64, f64) {
        (0.0, self.translate_y, 0.0)
    }

    /// Returns `true` if this is a zero translation.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.translate_y == 0.0
    }
}

/// Mounts scroll-linked parallax.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallaxController;

impl ParallaxController {
    /// Starts publishing a transform every frame.
    ///
    /// With `disabled = true`, or if the user prefers reduced motion at mount,
    /// the identity transform is published once and no frame loop runs.
    /// Viewport width and reduced motion are re-read on every frame while the
    /// loop runs.
    pub fn mount<E>(env: &Environment<E>, options: ParallaxOptions) -> ParallaxHandle {
        let options = options.sanitized();
        let initial = if !env.is_available() {
            env.tracer.inert_mount(&InertMountEvent {
                kind: ControllerKind::Parallax,
            });
            ParallaxTransform::identity(Suppression::Unavailable)
        } else if options.disabled {
            ParallaxTransform::identity(Suppression::Disabled)
        } else {
            ParallaxTransform::sample(
                env.scroll.scroll_y(),
                options.speed,
                env.viewport.viewport_width(),
                env.motion.prefers_reduced_motion(),
            )
        };

        let state = Rc::new(ParallaxState {
            options,
            current: Cell::new(initial),
            scroll: Rc::clone(&env.scroll),
            viewport: Rc::clone(&env.viewport),
            motion: Rc::clone(&env.motion),
            listeners: RefCell::new(Vec::new()),
            frame_loop: RefCell::new(None),
            disposed: Cell::new(false),
            tracer: env.tracer.clone(),
        });

        let animate = env.is_available()
            && !options.disabled
            && initial.suppressed != Some(Suppression::ReducedMotion);
        if animate {
            let weak = Rc::downgrade(&state);
            let frame_loop = FrameClock::new(Rc::clone(&env.frames)).schedule(move |tick| {
                if let Some(state) = weak.upgrade() {
                    state.on_tick(tick);
                }
            });
            state.tracer.frame_loop(&LoopEvent {
                kind: ControllerKind::Parallax,
                action: LoopAction::Started,
            });
            *state.frame_loop.borrow_mut() = Some(frame_loop);
        }

        ParallaxHandle { state }
    }
}

type UpdateListener = Box<dyn FnMut(ParallaxTransform)>;

struct ParallaxState {
    options: ParallaxOptions,
    current: Cell<ParallaxTransform>,
    scroll: Rc<dyn ScrollSource>,
    viewport: Rc<dyn ViewportSource>,
    motion: Rc<dyn MotionPreference>,
    listeners: RefCell<Vec<UpdateListener>>,
    frame_loop: RefCell<Option<FrameLoop>>,
    disposed: Cell<bool>,
    tracer: Tracer,
}

impl ParallaxState {
    fn on_tick(&self, tick: FrameTick) {
        if self.disposed.get() {
            return;
        }
        let scroll_y = self.scroll.scroll_y();
        let transform = ParallaxTransform::sample(
            scroll_y,
            self.options.speed,
            self.viewport.viewport_width(),
            self.motion.prefers_reduced_motion(),
        );
        self.current.set(transform);
        self.tracer.parallax_frame(&ParallaxFrameEvent {
            frame_index: tick.frame_index,
            scroll_y,
            offset_y: transform.translate_y,
            suppressed: transform.suppressed,
        });
        self.notify(transform);
    }

    fn notify(&self, transform: ParallaxTransform) {
        let mut listeners = core::mem::take(&mut *self.listeners.borrow_mut());
        for listener in &mut listeners {
            if self.disposed.get() {
                return;
            }
            listener(transform);
        }
        if self.disposed.get() {
            return;
        }
        // Keep listeners registered from inside a callback.
        let mut slot = self.listeners.borrow_mut();
        listeners.append(&mut slot);
        *slot = listeners;
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let frame_loop = self.frame_loop.borrow_mut().take();
        if let Some(frame_loop) = frame_loop {
            frame_loop.cancel();
            self.tracer.frame_loop(&LoopEvent {
                kind: ControllerKind::Parallax,
                action: LoopAction::Cancelled,
            });
        }
        self.listeners.borrow_mut().clear();
    }
}

/// Live handle returned by [`ParallaxController::mount`].
///
/// Dropping the handle disposes it.
#[must_use = "dropping a ParallaxHandle disposes it"]
pub struct ParallaxHandle {
    state: Rc<ParallaxState>,
}

impl ParallaxHandle {
    /// The most recently published transform.
    #[must_use]
    pub fn transform(&self) -> ParallaxTransform {
        self.state.current.get()
    }

    /// Returns the sanitized options this handle was mounted with.
    #[must_use]
    pub fn options(&self) -> ParallaxOptions {
        self.state.options
    }

    /// Returns `true` while a frame loop is publishing updates.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.state
            .frame_loop
            .borrow()
            .as_ref()
            .is_some_and(FrameLoop::is_running)
    }

    /// Calls `listener` with every transform published from now on.
    pub fn on_update(&self, listener: impl FnMut(ParallaxTransform) + 'static) {
        if !self.state.disposed.get() {
            self.state.listeners.borrow_mut().push(Box::new(listener));
        }
    }

    /// Cancels the frame loop. Idempotent.
    pub fn dispose(&self) {
        self.state.dispose();
    }
}

impl Drop for ParallaxHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl core::fmt::Debug for ParallaxHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParallaxHandle")
            .field("options", &self.state.options)
            .field("transform", &self.transform())
            .field("disposed", &self.state.disposed.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimElement, SimHost};

    fn desktop(scroll_y: f64) -> SimHost {
        let host = SimHost::new();
        host.set_viewport_width(1440.0);
        host.set_scroll_y(scroll_y);
        host
    }

    #[test]
    fn breakpoint_boundary() {
        for (width, expected) in [(1023.0, 0.0), (1024.0, 500.0)] {
            let host = SimHost::new();
            host.set_viewport_width(width);
            host.set_scroll_y(1000.0);
            let handle = ParallaxController::mount(&host.environment(), ParallaxOptions::new());
            host.run_frame();
            assert_eq!(
                handle.transform().translate_y,
                expected,
                "viewport width {width}"
            );
        }
    }

    #[test]
    fn tracks_scroll_each_frame() {
        let host = desktop(0.0);
        let handle = ParallaxController::mount(&host.environment(), ParallaxOptions::new().with_speed(0.25));
        host.run_frame();
        assert!(handle.transform().is_identity());

        host.set_scroll_y(40.0);
        host.set_scroll_y(400.0);
        host.run_frame();
        let transform = handle.transform();
        assert_eq!(transform.translation(), (0.0, 100.0, 0.0), "latest scroll wins");
        assert_eq!(transform.will_change, WillChange::Transform);
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn breakpoint_is_rechecked_on_resize() {
        let host = desktop(200.0);
        let handle = ParallaxController::mount(&host.environment(), ParallaxOptions::new());
        host.run_frame();
        assert_eq!(handle.transform().translate_y, 100.0);

        host.set_viewport_width(800.0);
        host.run_frame();
        assert_eq!(
            handle.transform(),
            ParallaxTransform::identity(Suppression::NarrowViewport)
        );

        host.set_viewport_width(1200.0);
        host.run_frame();
        assert_eq!(handle.transform().translate_y, 100.0);
    }

    #[test]
    fn reduced_motion_and_disabled_publish_identity() {
        let host = desktop(1000.0);
        host.set_reduced_motion(true);
        let reduced = ParallaxController::mount(&host.environment(), ParallaxOptions::new());
        assert_eq!(
            reduced.transform(),
            ParallaxTransform::identity(Suppression::ReducedMotion)
        );
        assert!(!reduced.is_animating());

        host.set_reduced_motion(false);
        let disabled =
            ParallaxController::mount(&host.environment(), ParallaxOptions::new().with_disabled(true));
        assert_eq!(disabled.transform().suppressed, Some(Suppression::Disabled));
        assert!(!disabled.is_animating());
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn reduced_motion_toggled_live() {
        let host = desktop(300.0);
        let handle = ParallaxController::mount(&host.environment(), ParallaxOptions::new());
        host.run_frame();
        assert_eq!(handle.transform().translate_y, 150.0);

        host.set_reduced_motion(true);
        host.run_frame();
        assert_eq!(handle.transform().will_change, WillChange::Auto);
        assert!(handle.transform().is_identity());
    }

    #[test]
    fn replaying_a_trace_reproduces_offsets() {
        let trace = [0.0, 12.5, 300.0, 299.0, 1_000.0, 0.0];
        let run = || {
            let host = desktop(0.0);
            let handle = ParallaxController::mount(&host.environment(), ParallaxOptions::new());
            let mut out = Vec::new();
            for y in trace {
                host.set_scroll_y(y);
                host.run_frame();
                out.push(handle.transform().translate_y);
            }
            out
        };
        assert_eq!(run(), run());
        assert_eq!(run(), [0.0, 6.25, 150.0, 149.5, 500.0, 0.0]);
    }

    #[test]
    fn listeners_see_every_frame_until_dispose() {
        let host = desktop(100.0);
        let handle = ParallaxController::mount(&host.environment(), ParallaxOptions::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        handle.on_update(move |t| sink.borrow_mut().push(t.translate_y));

        host.run_frames(2);
        assert_eq!(*seen.borrow(), [50.0, 50.0]);

        handle.dispose();
        handle.dispose();
        assert_eq!(host.pending_frames(), 0);
        host.run_frames(2);
        assert_eq!(seen.borrow().len(), 2, "no update after dispose");
    }

    #[test]
    fn drop_cancels_the_loop() {
        let host = desktop(0.0);
        let handle = ParallaxController::mount(&host.environment(), ParallaxOptions::new());
        assert_eq!(host.pending_frames(), 1);
        drop(handle);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn unavailable_environment_is_inert() {
        let handle = ParallaxController::mount(
            &Environment::<SimElement>::unavailable(),
            ParallaxOptions::new(),
        );
        assert_eq!(handle.transform().suppressed, Some(Suppression::Unavailable));
        assert!(!handle.is_animating());
    }

    #[test]
    fn speed_is_clamped() {
        assert_eq!(ParallaxOptions::new().with_speed(3.0).sanitized().speed, 1.0);
        assert_eq!(ParallaxOptions::new().with_speed(-1.0).sanitized().speed, 0.0);
        assert_eq!(ParallaxOptions::new().with_speed(f64::NAN).sanitized().speed, 0.5);
    }
}
