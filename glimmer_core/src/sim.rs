// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic in-memory host.
//!
//! [`SimHost`] implements every port in [`host`](crate::host) against a
//! manually advanced virtual clock. Nothing happens until the test says so:
//!
//! - [`SimHost::advance`] moves time forward and fires due timers in order.
//! - [`SimHost::run_frame`] advances by one [`frame_interval`] and then
//!   delivers the frame requests that were pending *before* the frame began.
//!   Requests made from inside a frame callback wait for the next frame.
//! - [`SimHost::layout`] delivers the initial size and intersection report
//!   of every observation registered since the previous layout.
//!
//! Callbacks are always invoked with no internal borrows held, so they may
//! freely call back into the host.
//!
//! [`frame_interval`]: SimHost::frame_interval

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use kurbo::Size;

use crate::host::{
    Environment, FrameCallback, FrameRequestId, FrameScheduler, IntersectionEntry,
    IntersectionOptions, IntersectionSource, MotionPreference, ObserverId, ResizeSource,
    ScrollSource, TimerId, TimerScheduler, ViewportSource,
};
use crate::time::{Duration, HostTime};

/// Default frame spacing, roughly 60 Hz.
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Default viewport width: a typical desktop window.
const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;

/// Handle to an element created with [`SimHost::create_element`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SimElement(pub u32);

type SizeCallback = Rc<RefCell<Box<dyn FnMut(Size)>>>;
type EntryCallback = Rc<RefCell<Box<dyn FnMut(IntersectionEntry)>>>;

struct ElementState {
    size: Size,
    attached: bool,
    ratio: f64,
}

struct PendingTimer {
    id: TimerId,
    due: HostTime,
    callback: Box<dyn FnOnce()>,
}

struct SizeObservation {
    id: ObserverId,
    element: SimElement,
    callback: SizeCallback,
    reported: bool,
}

struct IntersectionObservation {
    id: ObserverId,
    element: SimElement,
    options: IntersectionOptions,
    callback: EntryCallback,
    /// Inside/outside state of the last report; `None` before the first.
    last_inside: Option<bool>,
}

struct SimState {
    now: Cell<HostTime>,
    frame_interval: Cell<Duration>,
    next_id: Cell<u64>,
    reduced_motion: Cell<bool>,
    scroll_y: Cell<f64>,
    viewport_width: Cell<f64>,
    frames: RefCell<Vec<(FrameRequestId, FrameCallback)>>,
    timers: RefCell<Vec<PendingTimer>>,
    elements: RefCell<Vec<ElementState>>,
    sizes: RefCell<Vec<SizeObservation>>,
    intersections: RefCell<Vec<IntersectionObservation>>,
}

impl SimState {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn is_attached(&self, element: SimElement) -> bool {
        self.elements
            .borrow()
            .get(element.0 as usize)
            .is_some_and(|e| e.attached)
    }

    fn size_of(&self, element: SimElement) -> Option<Size> {
        self.elements.borrow().get(element.0 as usize).map(|e| e.size)
    }

    fn ratio_of(&self, element: SimElement) -> f64 {
        self.elements
            .borrow()
            .get(element.0 as usize)
            .map_or(0.0, |e| e.ratio)
    }
}

impl FrameScheduler for SimState {
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = FrameRequestId(self.next_id());
        self.frames.borrow_mut().push((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        self.frames.borrow_mut().retain(|(pending, _)| *pending != id);
    }
}

impl TimerScheduler for SimState {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id());
        self.timers.borrow_mut().push(PendingTimer {
            id,
            due: self.now.get() + delay,
            callback,
        });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timers.borrow_mut().retain(|t| t.id != id);
    }
}

impl MotionPreference for SimState {
    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion.get()
    }
}

impl ScrollSource for SimState {
    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }
}

impl ViewportSource for SimState {
    fn viewport_width(&self) -> f64 {
        self.viewport_width.get()
    }
}

impl ResizeSource<SimElement> for SimState {
    fn observe_size(&self, element: &SimElement, callback: Box<dyn FnMut(Size)>) -> Option<ObserverId> {
        if !self.is_attached(*element) {
            return None;
        }
        let id = ObserverId(self.next_id());
        self.sizes.borrow_mut().push(SizeObservation {
            id,
            element: *element,
            callback: Rc::new(RefCell::new(callback)),
            reported: false,
        });
        Some(id)
    }

    fn unobserve_size(&self, id: ObserverId) {
        self.sizes.borrow_mut().retain(|o| o.id != id);
    }
}

impl IntersectionSource<SimElement> for SimState {
    fn observe_intersection(
        &self,
        element: &SimElement,
        options: IntersectionOptions,
        callback: Box<dyn FnMut(IntersectionEntry)>,
    ) -> Option<ObserverId> {
        if !self.is_attached(*element) {
            return None;
        }
        let id = ObserverId(self.next_id());
        self.intersections.borrow_mut().push(IntersectionObservation {
            id,
            element: *element,
            options,
            callback: Rc::new(RefCell::new(callback)),
            last_inside: None,
        });
        Some(id)
    }

    fn unobserve_intersection(&self, id: ObserverId) {
        self.intersections.borrow_mut().retain(|o| o.id != id);
    }
}

fn is_inside(ratio: f64, threshold: f64) -> bool {
    ratio > 0.0 && ratio >= threshold
}

/// A manually driven host for tests and headless tools.
///
/// Cloning shares the same host.
#[derive(Clone)]
pub struct SimHost {
    state: Rc<SimState>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SimHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimHost")
            .field("now", &self.state.now.get())
            .field("pending_frames", &self.pending_frames())
            .field("pending_timers", &self.pending_timers())
            .finish_non_exhaustive()
    }
}

impl SimHost {
    /// Creates a host at time zero with a 1280 px wide viewport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(SimState {
                now: Cell::new(HostTime(0)),
                frame_interval: Cell::new(DEFAULT_FRAME_INTERVAL),
                next_id: Cell::new(1),
                reduced_motion: Cell::new(false),
                scroll_y: Cell::new(0.0),
                viewport_width: Cell::new(DEFAULT_VIEWPORT_WIDTH),
                frames: RefCell::new(Vec::new()),
                timers: RefCell::new(Vec::new()),
                elements: RefCell::new(Vec::new()),
                sizes: RefCell::new(Vec::new()),
                intersections: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Returns an environment backed by this host.
    #[must_use]
    pub fn environment(&self) -> Environment<SimElement> {
        Environment::new(
            self.state.clone(),
            self.state.clone(),
            self.state.clone(),
            self.state.clone(),
            self.state.clone(),
            self.state.clone(),
            self.state.clone(),
        )
    }

    /// Returns just the frame port.
    #[must_use]
    pub fn frame_scheduler(&self) -> Rc<dyn FrameScheduler> {
        self.state.clone()
    }

    // -- Clock ----------------------------------------------------------------

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.state.now.get()
    }

    /// Time advanced by each [`run_frame`](Self::run_frame).
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        self.state.frame_interval.get()
    }

    /// Changes the frame spacing.
    pub fn set_frame_interval(&self, interval: Duration) {
        self.state.frame_interval.set(interval.at_least(Duration(1)));
    }

    /// Moves time forward, firing due timers in deadline order.
    pub fn advance(&self, delta: Duration) {
        let target = self.now() + delta;
        loop {
            let next = {
                let mut timers = self.state.timers.borrow_mut();
                let earliest = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| t.due)
                    .map(|(index, _)| index);
                earliest.map(|index| timers.remove(index))
            };
            let Some(timer) = next else { break };
            if timer.due > self.now() {
                self.state.now.set(timer.due);
            }
            (timer.callback)();
        }
        self.state.now.set(target);
    }

    /// Moves time forward by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Runs one frame, [`frame_interval`](Self::frame_interval) after the
    /// previous one.
    pub fn run_frame(&self) {
        self.run_frame_after(self.frame_interval());
    }

    /// Advances by `delay`, then delivers pending frames and runs layout.
    pub fn run_frame_after(&self, delay: Duration) {
        self.advance(delay);
        let batch: Vec<FrameRequestId> = self.state.frames.borrow().iter().map(|(id, _)| *id).collect();
        let now = self.now();
        for id in batch {
            let callback = {
                let mut frames = self.state.frames.borrow_mut();
                frames
                    .iter()
                    .position(|(pending, _)| *pending == id)
                    .map(|index| frames.remove(index).1)
            };
            // Cancelled by an earlier callback in the same frame.
            if let Some(callback) = callback {
                callback(now);
            }
        }
        self.layout();
    }

    /// Runs `n` frames.
    pub fn run_frames(&self, n: usize) {
        for _ in 0..n {
            self.run_frame();
        }
    }

    /// Number of outstanding frame requests.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.state.frames.borrow().len()
    }

    /// Number of outstanding timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.timers.borrow().len()
    }

    // -- Global inputs ----------------------------------------------------------

    /// Sets the reduced-motion preference.
    pub fn set_reduced_motion(&self, reduced: bool) {
        self.state.reduced_motion.set(reduced);
    }

    /// Sets the vertical scroll offset.
    pub fn set_scroll_y(&self, scroll_y: f64) {
        self.state.scroll_y.set(scroll_y);
    }

    /// Sets the viewport width.
    pub fn set_viewport_width(&self, width: f64) {
        self.state.viewport_width.set(width);
    }

    // -- Elements ---------------------------------------------------------------

    /// Creates an attached, fully hidden element.
    pub fn create_element(&self, size: Size) -> SimElement {
        let mut elements = self.state.elements.borrow_mut();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "tests never create 2^32 elements"
        )]
        let element = SimElement(elements.len() as u32);
        elements.push(ElementState {
            size,
            attached: true,
            ratio: 0.0,
        });
        element
    }

    /// Removes an element from the document. Later observations fail.
    pub fn detach(&self, element: SimElement) {
        if let Some(state) = self.state.elements.borrow_mut().get_mut(element.0 as usize) {
            state.attached = false;
        }
    }

    /// Delivers the first report of every observation that has not had one.
    pub fn layout(&self) {
        let unreported: Vec<ObserverId> = self
            .state
            .sizes
            .borrow()
            .iter()
            .filter(|o| !o.reported)
            .map(|o| o.id)
            .collect();
        for id in unreported {
            let target = {
                let mut sizes = self.state.sizes.borrow_mut();
                sizes.iter_mut().find(|o| o.id == id).map(|o| {
                    o.reported = true;
                    (o.element, Rc::clone(&o.callback))
                })
            };
            if let Some((element, callback)) = target
                && let Some(size) = self.state.size_of(element)
            {
                call_size(&callback, size);
            }
        }

        let unreported: Vec<ObserverId> = self
            .state
            .intersections
            .borrow()
            .iter()
            .filter(|o| o.last_inside.is_none())
            .map(|o| o.id)
            .collect();
        for id in unreported {
            let target = {
                let mut observations = self.state.intersections.borrow_mut();
                observations.iter_mut().find(|o| o.id == id).map(|o| {
                    let ratio = self.state.ratio_of(o.element);
                    o.last_inside = Some(is_inside(ratio, o.options.threshold));
                    (ratio, Rc::clone(&o.callback))
                })
            };
            if let Some((ratio, callback)) = target {
                call_entry(&callback, ratio);
            }
        }
    }

    /// Changes an element's size and notifies observers that have already
    /// had their first report.
    pub fn resize(&self, element: SimElement, size: Size) {
        if let Some(state) = self.state.elements.borrow_mut().get_mut(element.0 as usize) {
            state.size = size;
        }
        let targets: Vec<ObserverId> = self
            .state
            .sizes
            .borrow()
            .iter()
            .filter(|o| o.element == element && o.reported)
            .map(|o| o.id)
            .collect();
        for id in targets {
            let callback = self
                .state
                .sizes
                .borrow()
                .iter()
                .find(|o| o.id == id)
                .map(|o| Rc::clone(&o.callback));
            if let Some(callback) = callback {
                call_size(&callback, size);
            }
        }
    }

    /// Changes an element's visible fraction and notifies observers whose
    /// threshold was crossed.
    pub fn set_visible_ratio(&self, element: SimElement, ratio: f64) {
        if let Some(state) = self.state.elements.borrow_mut().get_mut(element.0 as usize) {
            state.ratio = ratio;
        }
        let targets: Vec<ObserverId> = self
            .state
            .intersections
            .borrow()
            .iter()
            .filter(|o| o.element == element && o.last_inside.is_some())
            .map(|o| o.id)
            .collect();
        for id in targets {
            let callback = {
                let mut observations = self.state.intersections.borrow_mut();
                observations.iter_mut().find(|o| o.id == id).and_then(|o| {
                    let inside = is_inside(ratio, o.options.threshold);
                    if o.last_inside == Some(inside) {
                        return None;
                    }
                    o.last_inside = Some(inside);
                    Some(Rc::clone(&o.callback))
                })
            };
            if let Some(callback) = callback {
                call_entry(&callback, ratio);
            }
        }
    }

    /// Options of the first live intersection observation of `element`.
    #[must_use]
    pub fn intersection_options(&self, element: SimElement) -> Option<IntersectionOptions> {
        self.state
            .intersections
            .borrow()
            .iter()
            .find(|o| o.element == element)
            .map(|o| o.options)
    }

    /// Number of live size observations.
    #[must_use]
    pub fn active_resize_observers(&self) -> usize {
        self.state.sizes.borrow().len()
    }

    /// Number of live intersection observations.
    #[must_use]
    pub fn active_intersection_observers(&self) -> usize {
        self.state.intersections.borrow().len()
    }
}

fn call_size(callback: &SizeCallback, size: Size) {
    if let Ok(mut callback) = callback.try_borrow_mut() {
        callback(size);
    }
}

fn call_entry(callback: &EntryCallback, ratio: f64) {
    if let Ok(mut callback) = callback.try_borrow_mut() {
        callback(IntersectionEntry {
            is_intersecting: ratio > 0.0,
            ratio,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_in_deadline_order() {
        let host = SimHost::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let env = host.environment();
        for (ms, tag) in [(30_u64, 'c'), (10, 'a'), (20, 'b')] {
            let sink = Rc::clone(&order);
            let _ = env.timers.set_timeout(
                Duration::from_millis(ms),
                Box::new(move || sink.borrow_mut().push(tag)),
            );
        }
        host.advance_ms(25);
        assert_eq!(*order.borrow(), ['a', 'b']);
        host.advance_ms(5);
        assert_eq!(*order.borrow(), ['a', 'b', 'c']);
        assert_eq!(host.now(), HostTime::from_millis(30));
    }

    #[test]
    fn frames_requested_during_a_frame_wait() {
        let host = SimHost::new();
        let frames = host.frame_scheduler();
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        let again = Rc::clone(&frames);
        let _ = frames.request_frame(Box::new(move |_| {
            sink.set(sink.get() + 1);
            let sink = Rc::clone(&sink);
            let _ = again.request_frame(Box::new(move |_| sink.set(sink.get() + 1)));
        }));
        host.run_frame();
        assert_eq!(count.get(), 1);
        host.run_frame();
        assert_eq!(count.get(), 2);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn observers_may_unobserve_from_callback() {
        let host = SimHost::new();
        let element = host.create_element(Size::new(10.0, 10.0));
        let env = host.environment();
        let slot: Rc<Cell<Option<ObserverId>>> = Rc::new(Cell::new(None));
        let inner = Rc::clone(&slot);
        let source = Rc::clone(&env.intersection);
        let id = env.intersection.observe_intersection(
            &element,
            IntersectionOptions {
                threshold: 0.0,
                bottom_margin_px: 0.0,
            },
            Box::new(move |_| {
                if let Some(id) = inner.take() {
                    source.unobserve_intersection(id);
                }
            }),
        );
        slot.set(id);
        host.layout();
        assert_eq!(host.active_intersection_observers(), 0);
    }
}
