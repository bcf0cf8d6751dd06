// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element box-size observation.
//!
//! [`GeometryWatcher::observe`] wraps a host [`ResizeSource`] and forwards
//! size changes of one element. Zero-width reports mean "not laid out yet"
//! and are never forwarded; a report equal to the last forwarded size is
//! dropped.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use kurbo::Size;

use crate::host::{ObserverId, ResizeSource};

/// Observes the rendered box of elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryWatcher;

impl GeometryWatcher {
    /// Starts forwarding size changes of `element` to `callback`.
    ///
    /// If the element is detached, nothing is observed and the returned
    /// watch is already disposed.
    pub fn observe<E: 'static>(
        source: &Rc<dyn ResizeSource<E>>,
        element: &E,
        callback: impl FnMut(Size) + 'static,
    ) -> GeometryWatch<E> {
        let shared = Rc::new(WatchShared {
            last: Cell::new(None),
            disposed: Cell::new(false),
            callback: RefCell::new(Box::new(callback)),
        });

        let forward = Rc::clone(&shared);
        let id = source.observe_size(
            element,
            Box::new(move |size| forward.deliver(size)),
        );

        if id.is_none() {
            shared.disposed.set(true);
        }

        GeometryWatch {
            source: Rc::clone(source),
            id: Cell::new(id),
            shared,
        }
    }
}

struct WatchShared {
    /// Last forwarded size; the current geometry snapshot.
    last: Cell<Option<Size>>,
    disposed: Cell<bool>,
    callback: RefCell<Box<dyn FnMut(Size)>>,
}

impl WatchShared {
    fn deliver(&self, size: Size) {
        if self.disposed.get() || size.width.is_nan() || size.width <= 0.0 {
            return;
        }
        if self.last.get() == Some(size) {
            return;
        }
        self.last.set(Some(size));
        if let Ok(mut callback) = self.callback.try_borrow_mut() {
            callback(size);
        }
    }
}

/// Disposer for a [`GeometryWatcher::observe`] call.
///
/// Dropping the watch disposes it.
#[must_use = "dropping a GeometryWatch stops the observation"]
pub struct GeometryWatch<E> {
    source: Rc<dyn ResizeSource<E>>,
    id: Cell<Option<ObserverId>>,
    shared: Rc<WatchShared>,
}

impl<E> GeometryWatch<E> {
    /// Stops observing. Idempotent.
    pub fn dispose(&self) {
        self.shared.disposed.set(true);
        if let Some(id) = self.id.take() {
            self.source.unobserve_size(id);
        }
    }

    /// Returns `true` while the element is being observed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.shared.disposed.get()
    }

    /// Returns the most recently forwarded size, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Size> {
        self.shared.last.get()
    }
}

impl<E> Drop for GeometryWatch<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<E> core::fmt::Debug for GeometryWatch<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GeometryWatch")
            .field("active", &self.is_active())
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
