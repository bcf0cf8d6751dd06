// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fade-on-enter transitions.
//!
//! A [`FadeController`] drives a one-way state machine per element:
//!
//! ```text
//!   Pending ──(threshold crossed)──► Waiting ──(delay elapsed)──► Visible
//!      │                                                             ▲
//!      └──(reduced motion, or disabled, or delay == 0)───────────────┘
//! ```
//!
//! `Visible` is terminal. The controller only flips state; the view applies
//! [`FadeStyle`] with a CSS-level transition over
//! [`FadeOptions::duration`] so the flip reads as an animation.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use kurbo::Vec2;

use crate::host::{Environment, TimerId, TimerScheduler};
use crate::time::Duration;
use crate::trace::{ControllerKind, FadePhaseEvent, InertMountEvent, Tracer};
use crate::visibility::{VisibilityWatch, VisibilityWatcher};

/// Slide distance of the hidden pose, in spacing units.
pub const SLIDE_DISTANCE_UNITS: f64 = 6.0;

/// Size of one spacing unit, in pixels.
pub const SPACING_UNIT_PX: f64 = 4.0;

/// Which way the element travels while fading in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FadeDirection {
    /// Rises into place from below.
    #[default]
    Up,
    /// Drops into place from above.
    Down,
    /// Slides in from the right.
    Left,
    /// Slides in from the left.
    Right,
}

impl FadeDirection {
    /// Offset of the hidden pose relative to the settled pose, in pixels.
    #[must_use]
    pub fn hidden_offset(self) -> Vec2 {
        let d = SLIDE_DISTANCE_UNITS * SPACING_UNIT_PX;
        match self {
            Self::Up => Vec2::new(0.0, d),
            Self::Down => Vec2::new(0.0, -d),
            Self::Left => Vec2::new(d, 0.0),
            Self::Right => Vec2::new(-d, 0.0),
        }
    }
}

/// Options for [`FadeController::mount`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeOptions {
    /// Visible fraction (0–1) that triggers the fade.
    pub threshold: f64,
    /// Wait between the threshold crossing and the flip to visible.
    pub delay: Duration,
    /// Transition length the view should apply.
    pub duration: Duration,
    /// Travel direction of the hidden pose.
    pub direction: FadeDirection,
    /// Show immediately, without watching.
    pub disabled: bool,
}

impl Default for FadeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FadeOptions {
    /// Default options: threshold 0.3, no delay, 700 ms, upward.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: 0.3,
            delay: Duration::ZERO,
            duration: Duration::from_millis(700),
            direction: FadeDirection::Up,
            disabled: false,
        }
    }

    /// Sets the trigger threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the delay in milliseconds.
    #[must_use]
    pub const fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    /// Sets the transition duration in milliseconds.
    #[must_use]
    pub const fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration = Duration::from_millis(ms);
        self
    }

    /// Sets the travel direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: FadeDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Disables the animation; the element mounts visible.
    #[must_use]
    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Returns a copy with the threshold clamped to `[0, 1]`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.threshold = if self.threshold.is_nan() {
            Self::new().threshold
        } else {
            self.threshold.clamp(0.0, 1.0)
        };
        self
    }
}

/// Where the fade state machine is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FadePhase {
    /// Waiting for the element to enter the viewport.
    Pending,
    /// Entered; waiting out the delay.
    Waiting,
    /// Settled. Terminal.
    Visible,
}

/// Style the view applies to the faded element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeStyle {
    /// 0 while hidden, 1 once visible.
    pub opacity: f64,
    /// Translation from the settled position, in pixels.
    pub offset: Vec2,
    /// Transition length to apply between poses.
    pub duration: Duration,
}

impl FadeStyle {
    /// The hidden starting pose.
    #[must_use]
    pub fn hidden(direction: FadeDirection, duration: Duration) -> Self {
        Self {
            opacity: 0.0,
            offset: direction.hidden_offset(),
            duration,
        }
    }

    /// The settled pose.
    #[must_use]
    pub fn settled(duration: Duration) -> Self {
        Self {
            opacity: 1.0,
            offset: Vec2::ZERO,
            duration,
        }
    }

    /// Returns `true` for the settled pose.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.opacity >= 1.0 && self.offset == Vec2::ZERO
    }
}

/// Mounts fade-on-enter transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FadeController;

impl FadeController {
    /// Starts watching `element` and returns a live handle.
    ///
    /// The element becomes visible synchronously if `options.disabled` is
    /// set or the user prefers reduced motion. Against an unavailable
    /// environment the handle stays pending and never changes.
    pub fn mount<E: 'static>(env: &Environment<E>, element: &E, options: FadeOptions) -> FadeHandle<E> {
        let options = options.sanitized();
        let state = Rc::new(FadeState {
            options,
            phase: Cell::new(FadePhase::Pending),
            disposed: Cell::new(false),
            timer: Cell::new(None),
            timers: Rc::clone(&env.timers),
            watch: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            tracer: env.tracer.clone(),
        });

        if options.disabled {
            state.become_visible();
        } else if !env.is_available() {
            env.tracer.inert_mount(&InertMountEvent {
                kind: ControllerKind::Fade,
            });
        } else if env.prefers_reduced_motion() {
            state.become_visible();
        } else {
            let weak = Rc::downgrade(&state);
            let watch = VisibilityWatcher::watch(&env.intersection, element, options.threshold, move || {
                if let Some(state) = weak.upgrade() {
                    state.on_enter(&state);
                }
            });
            *state.watch.borrow_mut() = Some(watch);
        }

        FadeHandle { state }
    }
}

struct FadeState<E> {
    options: FadeOptions,
    phase: Cell<FadePhase>,
    disposed: Cell<bool>,
    timer: Cell<Option<TimerId>>,
    timers: Rc<dyn TimerScheduler>,
    watch: RefCell<Option<VisibilityWatch<E>>>,
    listeners: RefCell<Vec<Box<dyn FnOnce()>>>,
    tracer: Tracer,
}

impl<E: 'static> FadeState<E> {
    fn on_enter(&self, this: &Rc<Self>) {
        if self.disposed.get() || self.phase.get() != FadePhase::Pending {
            return;
        }
        if self.options.delay.is_zero() {
            self.become_visible();
            return;
        }

        self.transition(FadePhase::Waiting);
        let weak: Weak<Self> = Rc::downgrade(this);
        let id = self.timers.set_timeout(
            self.options.delay,
            Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.timer.set(None);
                    state.become_visible();
                }
            }),
        );
        self.timer.set(Some(id));
    }
}

impl<E> FadeState<E> {
    fn transition(&self, to: FadePhase) {
        let from = self.phase.replace(to);
        self.tracer.fade_phase(&FadePhaseEvent { from, to });
    }

    fn become_visible(&self) {
        if self.disposed.get() || self.phase.get() == FadePhase::Visible {
            return;
        }
        self.transition(FadePhase::Visible);
        let listeners = core::mem::take(&mut *self.listeners.borrow_mut());
        for listener in listeners {
            listener();
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(id) = self.timer.take() {
            self.timers.clear_timeout(id);
        }
        let watch = self.watch.borrow_mut().take();
        drop(watch);
        self.listeners.borrow_mut().clear();
    }
}

/// Live handle returned by [`FadeController::mount`].
///
/// Dropping the handle disposes it.
#[must_use = "dropping a FadeHandle disposes it"]
pub struct FadeHandle<E> {
    state: Rc<FadeState<E>>,
}

impl<E> FadeHandle<E> {
    /// Returns `true` once the element has settled.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state.phase.get() == FadePhase::Visible
    }

    /// Returns the current state machine phase.
    #[must_use]
    pub fn phase(&self) -> FadePhase {
        self.state.phase.get()
    }

    /// Returns the sanitized options this handle was mounted with.
    #[must_use]
    pub fn options(&self) -> FadeOptions {
        self.state.options
    }

    /// Returns the style to apply for the current phase.
    #[must_use]
    pub fn style(&self) -> FadeStyle {
        let options = self.state.options;
        if self.is_visible() {
            FadeStyle::settled(options.duration)
        } else {
            FadeStyle::hidden(options.direction, options.duration)
        }
    }

    /// Calls `listener` once when the element becomes visible, or right away
    /// if it already is. Never called after disposal.
    pub fn on_visible(&self, listener: impl FnOnce() + 'static) {
        if self.state.disposed.get() {
            return;
        }
        if self.is_visible() {
            listener();
        } else {
            self.state.listeners.borrow_mut().push(Box::new(listener));
        }
    }

    /// Stops watching and clears any pending delay. Idempotent.
    pub fn dispose(&self) {
        self.state.dispose();
    }

    /// Returns `true` once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }
}

impl<E> Drop for FadeHandle<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<E> core::fmt::Debug for FadeHandle<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FadeHandle")
            .field("phase", &self.phase())
            .field("options", &self.state.options)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use super::*;
    use crate::sim::{SimElement, SimHost};

    fn mount(host: &SimHost, options: FadeOptions) -> (FadeHandle<SimElement>, SimElement) {
        let element = host.create_element(Size::new(200.0, 100.0));
        let handle = FadeController::mount(&host.environment(), &element, options);
        host.layout();
        (handle, element)
    }

    #[test]
    fn pending_until_threshold_crossed() {
        let host = SimHost::new();
        let (handle, element) = mount(&host, FadeOptions::new());
        assert_eq!(handle.phase(), FadePhase::Pending);
        assert_eq!(handle.style(), FadeStyle::hidden(FadeDirection::Up, Duration::from_millis(700)));

        host.set_visible_ratio(element, 0.1);
        assert!(!handle.is_visible());

        host.set_visible_ratio(element, 0.3);
        assert!(handle.is_visible(), "no delay flips immediately");
        assert!(handle.style().is_settled());
    }

    #[test]
    fn delay_is_measured_from_crossing() {
        for threshold in [0.0, 0.3, 0.5, 1.0] {
            for delay in [1_u64, 250, 1_000] {
                let host = SimHost::new();
                let options = FadeOptions::new().with_threshold(threshold).with_delay_ms(delay);
                let (handle, element) = mount(&host, options);

                host.advance_ms(5_000);
                assert_eq!(handle.phase(), FadePhase::Pending, "delay alone never reveals");

                if threshold > 0.0 {
                    host.set_visible_ratio(element, threshold / 2.0);
                    host.advance_ms(delay);
                    assert_eq!(
                        handle.phase(),
                        FadePhase::Pending,
                        "below threshold={threshold}"
                    );
                }

                host.set_visible_ratio(element, if threshold > 0.0 { threshold } else { 0.01 });
                assert_eq!(handle.phase(), FadePhase::Waiting, "threshold={threshold}");

                host.advance_ms(delay - 1);
                assert!(
                    !handle.is_visible(),
                    "visible before {delay}ms elapsed at threshold={threshold}"
                );

                host.advance_ms(1);
                assert!(handle.is_visible(), "not visible at {delay}ms, threshold={threshold}");
            }
        }
    }

    #[test]
    fn reduced_motion_is_visible_synchronously() {
        for threshold in [0.0, 0.5, 1.0] {
            for delay in [0, 500] {
                let host = SimHost::new();
                host.set_reduced_motion(true);
                let element = host.create_element(Size::new(10.0, 10.0));
                let options = FadeOptions::new().with_threshold(threshold).with_delay_ms(delay);
                let handle = FadeController::mount(&host.environment(), &element, options);
                assert!(handle.is_visible(), "threshold={threshold} delay={delay}");
                assert_eq!(host.active_intersection_observers(), 0);
                assert_eq!(host.pending_timers(), 0);
            }
        }
    }

    #[test]
    fn disabled_is_visible_synchronously() {
        let host = SimHost::new();
        let (handle, _) = mount(&host, FadeOptions::new().with_disabled(true));
        assert!(handle.is_visible());
        assert_eq!(host.active_intersection_observers(), 0);

        let inert = FadeController::mount(
            &Environment::<SimElement>::unavailable(),
            &SimElement(0),
            FadeOptions::new().with_disabled(true),
        );
        assert!(inert.is_visible());
    }

    #[test]
    fn unmount_during_wait_never_reveals() {
        let host = SimHost::new();
        let (handle, element) = mount(&host, FadeOptions::new().with_delay_ms(1_000));
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        handle.on_visible(move || flag.set(true));

        host.set_visible_ratio(element, 1.0);
        assert_eq!(host.pending_timers(), 1);

        host.advance_ms(500);
        drop(handle);
        assert_eq!(host.pending_timers(), 0, "timer cleared on unmount");

        host.advance_ms(2_000);
        assert!(!fired.get(), "listener fired after unmount");
    }

    #[test]
    fn dispose_twice_is_harmless() {
        let host = SimHost::new();
        let (handle, element) = mount(&host, FadeOptions::new());
        handle.dispose();
        handle.dispose();
        assert!(handle.is_disposed());
        assert_eq!(host.active_intersection_observers(), 0);
        host.set_visible_ratio(element, 1.0);
        assert!(!handle.is_visible());
    }

    #[test]
    fn unavailable_environment_is_inert() {
        let handle = FadeController::mount(
            &Environment::<SimElement>::unavailable(),
            &SimElement(0),
            FadeOptions::new(),
        );
        assert_eq!(handle.phase(), FadePhase::Pending);
        handle.dispose();
    }

    #[test]
    fn on_visible_fires_once() {
        let host = SimHost::new();
        let (handle, element) = mount(&host, FadeOptions::new());
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        handle.on_visible(move || sink.set(sink.get() + 1));

        host.set_visible_ratio(element, 1.0);
        host.set_visible_ratio(element, 0.0);
        host.set_visible_ratio(element, 1.0);
        assert_eq!(count.get(), 1);

        let late = Rc::new(Cell::new(false));
        let flag = Rc::clone(&late);
        handle.on_visible(move || flag.set(true));
        assert!(late.get(), "already visible calls right away");
    }

    #[test]
    fn direction_sets_hidden_offset() {
        assert_eq!(FadeDirection::Up.hidden_offset(), Vec2::new(0.0, 24.0));
        assert_eq!(FadeDirection::Down.hidden_offset(), Vec2::new(0.0, -24.0));
        assert_eq!(FadeDirection::Left.hidden_offset(), Vec2::new(24.0, 0.0));
        assert_eq!(FadeDirection::Right.hidden_offset(), Vec2::new(-24.0, 0.0));
    }

    #[test]
    fn sanitized_clamps_threshold() {
        assert_eq!(FadeOptions::new().with_threshold(-1.0).sanitized().threshold, 0.0);
        assert_eq!(FadeOptions::new().with_threshold(2.0).sanitized().threshold, 1.0);
        assert_eq!(FadeOptions::new().with_threshold(f64::NAN).sanitized().threshold, 0.3);
    }
}
