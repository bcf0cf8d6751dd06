// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` and `setTimeout` ports.
//!
//! Each request owns a JS closure that lives in a table keyed by request id
//! until it fires or is cancelled. Each rAF callback receives a
//! [`DOMHighResTimeStamp`][mdn] (milliseconds from `performance.now()`),
//! which is converted to microsecond [`HostTime`] ticks.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};

use hashbrown::HashMap;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use glimmer_core::host::{FrameCallback, FrameRequestId, FrameScheduler, TimerId, TimerScheduler};
use glimmer_core::time::{Duration, HostTime};

// Direct global bindings instead of `web_sys::Window` methods: no Window
// lookup per request.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// Milliseconds to pass to `setTimeout`, saturated to its `i32` argument.
pub(crate) fn timeout_ms(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}

/// A registered JS callback and the host handle it was registered under.
struct Registration<Args: ?Sized> {
    handle: i32,
    _closure: Closure<Args>,
}

struct Table<Args: ?Sized> {
    next_id: Cell<u64>,
    pending: RefCell<HashMap<u64, Registration<Args>>>,
}

impl<Args: ?Sized> Table<Args> {
    fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            pending: RefCell::new(HashMap::new()),
        }
    }

    fn allocate(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn insert(&self, id: u64, registration: Registration<Args>) {
        self.pending.borrow_mut().insert(id, registration);
    }

    /// Removes a registration. Its closure is released once the current JS
    /// call, if any, returns.
    fn remove(&self, id: u64) -> Option<i32> {
        let registration = self.pending.borrow_mut().remove(&id);
        registration.map(|r| r.handle)
    }

    fn len(&self) -> usize {
        self.pending.borrow().len()
    }
}

/// [`FrameScheduler`] backed by `requestAnimationFrame`.
pub struct RafFrames {
    table: Rc<Table<dyn FnMut(f64)>>,
}

impl Default for RafFrames {
    fn default() -> Self {
        Self::new()
    }
}

impl RafFrames {
    /// Creates a scheduler with no pending requests.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Rc::new(Table::new()),
        }
    }

    /// Number of requests that have neither fired nor been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.table.len()
    }
}

impl FrameScheduler for RafFrames {
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = self.table.allocate();
        let table: Weak<Table<dyn FnMut(f64)>> = Rc::downgrade(&self.table);
        let mut callback = Some(callback);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if let Some(table) = table.upgrade() {
                table.remove(id);
            }
            if let Some(callback) = callback.take() {
                callback(HostTime::from_millis_f64(timestamp_ms));
            }
        }) as Box<dyn FnMut(f64)>);

        let handle = request_animation_frame(closure.as_ref().unchecked_ref());
        self.table.insert(
            id,
            Registration {
                handle,
                _closure: closure,
            },
        );
        FrameRequestId(id)
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        if let Some(handle) = self.table.remove(id.0) {
            cancel_animation_frame(handle);
        }
    }
}

impl Drop for RafFrames {
    fn drop(&mut self) {
        for (_, registration) in self.table.pending.borrow_mut().drain() {
            cancel_animation_frame(registration.handle);
        }
    }
}

impl core::fmt::Debug for RafFrames {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafFrames")
            .field("pending", &self.pending())
            .finish()
    }
}

/// [`TimerScheduler`] backed by `setTimeout`.
pub struct WindowTimers {
    table: Rc<Table<dyn FnMut()>>,
}

impl Default for WindowTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowTimers {
    /// Creates a scheduler with no pending timers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Rc::new(Table::new()),
        }
    }

    /// Number of timers that have neither fired nor been cleared.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.table.len()
    }
}

impl TimerScheduler for WindowTimers {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.table.allocate();
        let table: Weak<Table<dyn FnMut()>> = Rc::downgrade(&self.table);
        let mut callback = Some(callback);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(table) = table.upgrade() {
                table.remove(id);
            }
            if let Some(callback) = callback.take() {
                callback();
            }
        }) as Box<dyn FnMut()>);

        let handle = set_timeout(closure.as_ref().unchecked_ref(), timeout_ms(delay));
        self.table.insert(
            id,
            Registration {
                handle,
                _closure: closure,
            },
        );
        TimerId(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(handle) = self.table.remove(id.0) {
            clear_timeout(handle);
        }
    }
}

impl Drop for WindowTimers {
    fn drop(&mut self) {
        for (_, registration) in self.table.pending.borrow_mut().drain() {
            clear_timeout(registration.handle);
        }
    }
}

impl core::fmt::Debug for WindowTimers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowTimers")
            .field("pending", &self.pending())
            .finish()
    }
}
