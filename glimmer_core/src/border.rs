// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A lit segment travelling around a pill-shaped border.
//!
//! [`MovingBorderAnimator`] strokes a rounded rectangle (corner radius
//! `height / 2`) with a single dash of `path_length * segment_fraction`
//! followed by a gap covering the rest of the perimeter. Sliding the dash
//! offset from `0` to `-path_length` once per loop moves the dash around the
//! closed outline.
//!
//! ```text
//!   resize ──► geometry (radius, path length, dash) ──► dirty
//!                                                          │
//!   frame tick ──► publish outline if dirty ──► publish dash offset
//! ```
//!
//! Two [`StrokeTarget`]s receive the same geometry and offset: a wide
//! blurred glow and a narrow solid stroke, so they travel in lockstep.
//! Geometry changes never touch the loop's time base.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::f64::consts::PI;

use kurbo::{RoundedRect, Size};

use crate::clock::{FrameClock, FrameLoop, FrameTick};
use crate::geometry::{GeometryWatch, GeometryWatcher};
use crate::host::{Environment, FrameScheduler, MotionPreference};
use crate::time::{Duration, HostTime};
use crate::trace::{
    BorderFrameEvent, BorderGeometryEvent, ControllerKind, InertMountEvent, LoopAction,
    LoopEvent, Tracer,
};

/// Glow stroke width as a multiple of the solid stroke width.
pub const GLOW_WIDTH_FACTOR: f64 = 2.0;

/// Gaussian blur radius of the glow stroke, in pixels.
pub const GLOW_BLUR_PX: f64 = 4.0;

/// Shortest accepted loop.
const MIN_LOOP_DURATION: Duration = Duration::from_millis(1);

/// Smallest accepted segment fraction.
const MIN_SEGMENT_FRACTION: f64 = 0.001;

/// Options for [`MovingBorderAnimator::mount`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovingBorderOptions {
    /// Solid stroke width in pixels.
    pub stroke_width: f64,
    /// Time for the segment to travel once around the outline.
    pub loop_duration: Duration,
    /// Lit fraction of the perimeter.
    pub segment_fraction: f64,
}

impl Default for MovingBorderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl MovingBorderOptions {
    /// Default options: 2 px stroke, 1500 ms loop, half the perimeter lit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stroke_width: 2.0,
            loop_duration: Duration::from_millis(1500),
            segment_fraction: 0.5,
        }
    }

    /// Sets the stroke width.
    #[must_use]
    pub const fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = width;
        self
    }

    /// Sets the loop duration in milliseconds.
    #[must_use]
    pub const fn with_loop_duration_ms(mut self, ms: u64) -> Self {
        self.loop_duration = Duration::from_millis(ms);
        self
    }

    /// Sets the lit fraction.
    #[must_use]
    pub const fn with_segment_fraction(mut self, fraction: f64) -> Self {
        self.segment_fraction = fraction;
        self
    }

    /// Returns a copy with every field clamped to its valid range.
    ///
    /// Stroke width is at least 0, the loop at least 1 ms, and the segment
    /// fraction within `[0.001, 1]`.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let stroke_width = if self.stroke_width.is_nan() {
            Self::new().stroke_width
        } else {
            self.stroke_width.max(0.0)
        };
        let segment_fraction = if self.segment_fraction.is_nan() {
            Self::new().segment_fraction
        } else {
            self.segment_fraction.clamp(MIN_SEGMENT_FRACTION, 1.0)
        };
        Self {
            stroke_width,
            loop_duration: self.loop_duration.at_least(MIN_LOOP_DURATION),
            segment_fraction,
        }
    }
}

/// Corner radius of the pill outline for an element of `size`.
///
/// Half the height, capped at half the width the way SVG clamps `rx`.
#[must_use]
pub fn pill_radius(size: Size) -> f64 {
    (size.height / 2.0).min(size.width / 2.0).max(0.0)
}

/// Perimeter of the pill outline for an element of `size`.
#[must_use]
pub fn pill_path_length(size: Size) -> f64 {
    let r = pill_radius(size);
    let straight = 2.0 * (size.width - 2.0 * r).max(0.0) + 2.0 * (size.height - 2.0 * r).max(0.0);
    straight + 2.0 * PI * r
}

/// Dash offset after `elapsed`, for a loop of `loop_duration` around a path
/// of `path_length`.
///
/// Always in `(-path_length, 0]`.
#[must_use]
pub fn dash_offset(elapsed: Duration, loop_duration: Duration, path_length: f64) -> f64 {
    let period = loop_duration.at_least(MIN_LOOP_DURATION).ticks();
    let progress = (elapsed.ticks() % period) as f64 / period as f64;
    -progress * path_length
}

/// Lit segment and trailing gap, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashPattern {
    /// Length of the lit segment.
    pub segment: f64,
    /// Length of the unlit remainder.
    pub gap: f64,
    /// Perimeter the pattern was split from.
    pub path_length: f64,
}

impl DashPattern {
    /// Splits `path_length` into a segment of `fraction` and the remaining
    /// gap.
    #[must_use]
    pub fn from_fraction(path_length: f64, fraction: f64) -> Self {
        let segment = path_length * fraction.clamp(0.0, 1.0);
        Self {
            segment,
            gap: path_length - segment,
            path_length,
        }
    }

    /// Total pattern length. Exactly the path length it was split from;
    /// `segment + gap` may differ from it in the last bit.
    #[must_use]
    pub fn period(&self) -> f64 {
        self.path_length
    }
}

/// Which of the paired strokes a style describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrokeRole {
    /// The wide blurred underlay.
    Glow,
    /// The crisp stroke.
    Solid,
}

/// Paint parameters of one stroke. Both strokes use round caps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Which stroke this is.
    pub role: StrokeRole,
    /// Stroke width in pixels.
    pub width: f64,
    /// Blur radius in pixels; zero for no blur.
    pub blur: f64,
}

impl StrokeStyle {
    /// Style of the glow stroke for a solid stroke of `stroke_width`.
    #[must_use]
    pub fn glow(stroke_width: f64) -> Self {
        Self {
            role: StrokeRole::Glow,
            width: stroke_width * GLOW_WIDTH_FACTOR,
            blur: GLOW_BLUR_PX,
        }
    }

    /// Style of the solid stroke.
    #[must_use]
    pub fn solid(stroke_width: f64) -> Self {
        Self {
            role: StrokeRole::Solid,
            width: stroke_width,
            blur: 0.0,
        }
    }
}

/// Everything a stroke target needs to draw the outline, minus the offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderOutline {
    /// Element size.
    pub size: Size,
    /// Pill corner radius.
    pub corner_radius: f64,
    /// Perimeter of the outline.
    pub path_length: f64,
    /// Paint of this stroke.
    pub stroke: StrokeStyle,
    /// Dash geometry shared by both strokes.
    pub dash: DashPattern,
}

impl BorderOutline {
    /// The outline as a kurbo shape at the origin.
    #[must_use]
    pub fn rounded_rect(&self) -> RoundedRect {
        RoundedRect::new(0.0, 0.0, self.size.width, self.size.height, self.corner_radius)
    }
}

/// A drawing primitive owned by the view that the animator writes to.
///
/// Writes happen directly from the frame loop, without going through the
/// view's render cycle.
pub trait StrokeTarget {
    /// Replaces the outline geometry, paint, and dash pattern.
    fn set_outline(&mut self, outline: &BorderOutline);

    /// Sets the dash offset in pixels.
    fn set_dash_offset(&mut self, offset: f64);
}

/// Snapshot of a moving border, for inspection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathAnimationState {
    /// Last accepted element size.
    pub size: Option<Size>,
    /// Perimeter for `size`; zero until the first layout.
    pub path_length: f64,
    /// Last published dash offset.
    pub dash_offset: f64,
    /// Lit fraction of the perimeter.
    pub segment_fraction: f64,
    /// Solid stroke width.
    pub stroke_width: f64,
    /// Loop duration.
    pub loop_duration: Duration,
    /// Timestamp of the loop's first frame.
    pub start: Option<HostTime>,
    /// Time since `start` at the last frame.
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Geometry {
    size: Size,
    radius: f64,
    path_length: f64,
    dash: DashPattern,
}

/// Mounts moving borders.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovingBorderAnimator;

impl MovingBorderAnimator {
    /// Starts observing `element` and animating `glow` and `solid`.
    ///
    /// Nothing is drawn until the element has a positive width. The frame
    /// loop starts with the first usable geometry. Reduced motion is read
    /// each time geometry arrives: while it is on, the loop is stopped and
    /// the outline is drawn with the dash at offset 0.
    pub fn mount<E: 'static>(
        env: &Environment<E>,
        element: &E,
        options: MovingBorderOptions,
        glow: Box<dyn StrokeTarget>,
        solid: Box<dyn StrokeTarget>,
    ) -> MovingBorderHandle<E> {
        let options = options.sanitized();
        let state = Rc::new(BorderState {
            options,
            motion: Rc::clone(&env.motion),
            glow: RefCell::new(glow),
            solid: RefCell::new(solid),
            geometry: Cell::new(None),
            dirty: Cell::new(false),
            dash_offset: Cell::new(0.0),
            start: Cell::new(None),
            elapsed: Cell::new(Duration::ZERO),
            frames: Rc::clone(&env.frames),
            frame_loop: RefCell::new(None),
            watch: RefCell::new(None),
            disposed: Cell::new(false),
            tracer: env.tracer.clone(),
        });

        if !env.is_available() {
            env.tracer.inert_mount(&InertMountEvent {
                kind: ControllerKind::MovingBorder,
            });
            return MovingBorderHandle { state };
        }

        let weak = Rc::downgrade(&state);
        let watch = GeometryWatcher::observe(&env.resize, element, move |size| {
            if let Some(state) = weak.upgrade() {
                state.on_geometry(&state, size);
            }
        });
        *state.watch.borrow_mut() = Some(watch);

        MovingBorderHandle { state }
    }
}

struct BorderState<E> {
    options: MovingBorderOptions,
    motion: Rc<dyn MotionPreference>,
    glow: RefCell<Box<dyn StrokeTarget>>,
    solid: RefCell<Box<dyn StrokeTarget>>,
    geometry: Cell<Option<Geometry>>,
    /// Geometry changed since the outline was last published.
    dirty: Cell<bool>,
    dash_offset: Cell<f64>,
    start: Cell<Option<HostTime>>,
    elapsed: Cell<Duration>,
    frames: Rc<dyn FrameScheduler>,
    frame_loop: RefCell<Option<FrameLoop>>,
    watch: RefCell<Option<GeometryWatch<E>>>,
    disposed: Cell<bool>,
    tracer: Tracer,
}

impl<E: 'static> BorderState<E> {
    fn on_geometry(&self, this: &Rc<Self>, size: Size) {
        if self.disposed.get() {
            return;
        }
        let path_length = pill_path_length(size);
        let geometry = Geometry {
            size,
            radius: pill_radius(size),
            path_length,
            dash: DashPattern::from_fraction(path_length, self.options.segment_fraction),
        };
        self.geometry.set(Some(geometry));
        self.dirty.set(true);
        self.tracer.border_geometry(&BorderGeometryEvent {
            width: size.width,
            height: size.height,
            path_length,
        });

        if self.motion.prefers_reduced_motion() {
            self.stop_loop();
            self.publish_outline(geometry);
            self.publish_offset(0.0);
            return;
        }

        // Started once; later resizes only mark the outline dirty.
        if self.frame_loop.borrow().is_none() {
            let weak = Rc::downgrade(this);
            let frame_loop = FrameClock::new(Rc::clone(&self.frames)).schedule(move |tick| {
                if let Some(state) = weak.upgrade() {
                    state.on_tick(tick);
                }
            });
            self.tracer.frame_loop(&LoopEvent {
                kind: ControllerKind::MovingBorder,
                action: LoopAction::Started,
            });
            *self.frame_loop.borrow_mut() = Some(frame_loop);
        }
    }
}

impl<E> BorderState<E> {
    fn on_tick(&self, tick: FrameTick) {
        if self.disposed.get() {
            return;
        }
        let Some(geometry) = self.geometry.get() else {
            return;
        };
        if self.start.get().is_none() {
            self.start.set(Some(tick.now));
        }
        self.elapsed.set(tick.elapsed);

        if self.dirty.get() {
            self.publish_outline(geometry);
        }
        let offset = dash_offset(tick.elapsed, self.options.loop_duration, geometry.path_length);
        self.publish_offset(offset);
        self.tracer.border_frame(&BorderFrameEvent {
            frame_index: tick.frame_index,
            elapsed: tick.elapsed,
            dash_offset: offset,
        });
    }

    fn publish_outline(&self, geometry: Geometry) {
        self.dirty.set(false);
        let outline = |stroke| BorderOutline {
            size: geometry.size,
            corner_radius: geometry.radius,
            path_length: geometry.path_length,
            stroke,
            dash: geometry.dash,
        };
        if let Ok(mut glow) = self.glow.try_borrow_mut() {
            glow.set_outline(&outline(StrokeStyle::glow(self.options.stroke_width)));
        }
        if let Ok(mut solid) = self.solid.try_borrow_mut() {
            solid.set_outline(&outline(StrokeStyle::solid(self.options.stroke_width)));
        }
    }

    fn publish_offset(&self, offset: f64) {
        self.dash_offset.set(offset);
        if let Ok(mut glow) = self.glow.try_borrow_mut() {
            glow.set_dash_offset(offset);
        }
        if let Ok(mut solid) = self.solid.try_borrow_mut() {
            solid.set_dash_offset(offset);
        }
    }

    fn stop_loop(&self) {
        let frame_loop = self.frame_loop.borrow_mut().take();
        if let Some(frame_loop) = frame_loop {
            frame_loop.cancel();
            self.start.set(None);
            self.elapsed.set(Duration::ZERO);
            self.tracer.frame_loop(&LoopEvent {
                kind: ControllerKind::MovingBorder,
                action: LoopAction::Cancelled,
            });
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.stop_loop();
        let watch = self.watch.borrow_mut().take();
        drop(watch);
    }
}

/// Live handle returned by [`MovingBorderAnimator::mount`].
///
/// Dropping the handle disposes it.
#[must_use = "dropping a MovingBorderHandle stops the animation"]
pub struct MovingBorderHandle<E> {
    state: Rc<BorderState<E>>,
}

impl<E> MovingBorderHandle<E> {
    /// Returns a snapshot of the animation.
    #[must_use]
    pub fn state(&self) -> PathAnimationState {
        let s = &self.state;
        let geometry = s.geometry.get();
        PathAnimationState {
            size: geometry.map(|g| g.size),
            path_length: geometry.map_or(0.0, |g| g.path_length),
            dash_offset: s.dash_offset.get(),
            segment_fraction: s.options.segment_fraction,
            stroke_width: s.options.stroke_width,
            loop_duration: s.options.loop_duration,
            start: s.start.get(),
            elapsed: s.elapsed.get(),
        }
    }

    /// Returns the current dash pattern, once geometry is known.
    #[must_use]
    pub fn dash_pattern(&self) -> Option<DashPattern> {
        self.state.geometry.get().map(|g| g.dash)
    }

    /// Returns `true` while the frame loop runs.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.state
            .frame_loop
            .borrow()
            .as_ref()
            .is_some_and(FrameLoop::is_running)
    }

    /// Stops the loop and the size observation. Idempotent.
    pub fn dispose(&self) {
        self.state.dispose();
    }
}

impl<E> Drop for MovingBorderHandle<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<E> core::fmt::Debug for MovingBorderHandle<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MovingBorderHandle")
            .field("state", &self.state())
            .field("disposed", &self.state.disposed.get())
            .finish_non_exhaustive()
    }
}
