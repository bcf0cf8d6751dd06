// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cancellable per-frame loops.
//!
//! [`FrameClock`] turns the host's one-shot [`FrameScheduler`] into a
//! perpetual loop: [`FrameClock::schedule`] registers a callback that runs
//! once per display frame with a [`FrameTick`] until the returned
//! [`FrameLoop`] is cancelled or dropped.
//!
//! A loop holds at most one pending frame request at any time. Any number of
//! invalidations between two frames (scroll events, resizes) are observed by
//! the next single tick, so work is coalesced to one callback per frame.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};

use crate::host::{FrameRequestId, FrameScheduler};
use crate::time::{Duration, HostTime};

/// A frame delivered to a [`FrameClock`] callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameTick {
    /// Host timestamp of this frame.
    pub now: HostTime,
    /// Time since the loop's first frame. Zero on the first frame.
    pub elapsed: Duration,
    /// Monotonically increasing frame counter, starting at zero.
    pub frame_index: u64,
}

/// Schedules per-frame loops against a host [`FrameScheduler`].
///
/// Each controller owns its own clock and loops; nothing is pooled.
#[derive(Clone)]
pub struct FrameClock {
    frames: Rc<dyn FrameScheduler>,
}

impl core::fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameClock").finish_non_exhaustive()
    }
}

impl FrameClock {
    /// Creates a clock over the given host primitive.
    #[must_use]
    pub fn new(frames: Rc<dyn FrameScheduler>) -> Self {
        Self { frames }
    }

    /// Starts a loop calling `callback` once per frame.
    ///
    /// The first frame is requested immediately. The loop runs until
    /// [`FrameLoop::cancel`] is called or the handle is dropped.
    pub fn schedule(&self, callback: impl FnMut(FrameTick) + 'static) -> FrameLoop {
        let inner = Rc::new(LoopInner {
            frames: Rc::clone(&self.frames),
            callback: RefCell::new(Box::new(callback)),
            start: Cell::new(None),
            frame_counter: Cell::new(0),
            running: Cell::new(true),
            pending: Cell::new(None),
        });
        LoopInner::request_next(&inner);
        FrameLoop { inner }
    }
}

/// Handle to a running frame loop.
///
/// Cancelling is idempotent and safe after the loop has already stopped.
/// Dropping the handle cancels the loop.
#[must_use = "dropping a FrameLoop cancels it"]
pub struct FrameLoop {
    inner: Rc<LoopInner>,
}

struct LoopInner {
    frames: Rc<dyn FrameScheduler>,

    /// The user callback. Only borrowed while a frame is being delivered.
    callback: RefCell<Box<dyn FnMut(FrameTick)>>,

    /// Timestamp of the first delivered frame; the elapsed-time origin.
    start: Cell<Option<HostTime>>,

    /// Becomes `FrameTick::frame_index`.
    frame_counter: Cell<u64>,

    running: Cell<bool>,

    /// The single outstanding request, if any.
    pending: Cell<Option<FrameRequestId>>,
}

impl LoopInner {
    fn request_next(this: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(this);
        let id = this.frames.request_frame(Box::new(move |now| {
            if let Some(inner) = weak.upgrade() {
                inner.on_frame(&inner, now);
            }
        }));
        this.pending.set(Some(id));
    }

    fn on_frame(&self, this: &Rc<Self>, now: HostTime) {
        self.pending.set(None);
        if !self.running.get() {
            return;
        }

        let start = match self.start.get() {
            Some(start) => start,
            None => {
                self.start.set(Some(now));
                now
            }
        };
        let frame_index = self.frame_counter.get();
        self.frame_counter.set(frame_index + 1);

        let tick = FrameTick {
            now,
            elapsed: now.saturating_duration_since(start),
            frame_index,
        };

        // The callback may cancel this loop; `running` is re-checked below.
        if let Ok(mut callback) = self.callback.try_borrow_mut() {
            callback(tick);
        }

        if self.running.get() && self.pending.get().is_none() {
            Self::request_next(this);
        }
    }

    fn cancel(&self) {
        self.running.set(false);
        if let Some(id) = self.pending.take() {
            self.frames.cancel_frame(id);
        }
    }
}

impl FrameLoop {
    /// Stops the loop and cancels its pending frame request.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns `true` until the loop is cancelled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Returns the number of frames delivered so far.
    #[must_use]
    pub fn frames_delivered(&self) -> u64 {
        self.inner.frame_counter.get()
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl core::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("running", &self.inner.running.get())
            .field("frame_counter", &self.inner.frame_counter.get())
            .field("start", &self.inner.start.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::sim::SimHost;

    fn recording_loop(host: &SimHost) -> (FrameLoop, Rc<RefCell<Vec<FrameTick>>>) {
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ticks);
        let clock = FrameClock::new(host.frame_scheduler());
        let handle = clock.schedule(move |tick| sink.borrow_mut().push(tick));
        (handle, ticks)
    }

    #[test]
    fn elapsed_is_measured_from_first_frame() {
        let host = SimHost::new();
        host.advance_ms(100);
        let (handle, ticks) = recording_loop(&host);

        host.run_frames(3);

        let ticks = ticks.borrow();
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[0].elapsed, Duration::ZERO);
        assert_eq!(ticks[1].elapsed, host.frame_interval());
        assert_eq!(ticks[2].frame_index, 2);
        assert!(handle.is_running());
    }

    #[test]
    fn at_most_one_pending_request() {
        let host = SimHost::new();
        let (_handle, _ticks) = recording_loop(&host);
        assert_eq!(host.pending_frames(), 1);
        host.run_frames(5);
        assert_eq!(host.pending_frames(), 1, "loop re-registers exactly once");
    }

    #[test]
    fn cancel_is_idempotent_and_stops_callbacks() {
        let host = SimHost::new();
        let (handle, ticks) = recording_loop(&host);
        host.run_frames(2);

        handle.cancel();
        handle.cancel();
        assert!(!handle.is_running());
        assert_eq!(host.pending_frames(), 0);

        host.run_frames(3);
        assert_eq!(ticks.borrow().len(), 2, "no frames after cancel");
    }

    #[test]
    fn drop_cancels() {
        let host = SimHost::new();
        let (handle, ticks) = recording_loop(&host);
        drop(handle);
        assert_eq!(host.pending_frames(), 0);
        host.run_frames(2);
        assert!(ticks.borrow().is_empty());
    }

    #[test]
    fn callback_may_cancel_its_own_loop() {
        let host = SimHost::new();
        let clock = FrameClock::new(host.frame_scheduler());
        let slot: Rc<RefCell<Option<FrameLoop>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0_u32));

        let slot_in = Rc::clone(&slot);
        let count_in = Rc::clone(&count);
        let handle = clock.schedule(move |tick| {
            count_in.set(count_in.get() + 1);
            if tick.frame_index == 1
                && let Some(handle) = slot_in.borrow().as_ref()
            {
                handle.cancel();
            }
        });
        *slot.borrow_mut() = Some(handle);

        host.run_frames(5);
        assert_eq!(count.get(), 2);
        assert_eq!(host.pending_frames(), 0);
    }
}
