// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot viewport entry detection.
//!
//! [`VisibilityWatcher::watch`] fires its callback the first time an
//! element's visible fraction reaches a threshold, then detaches from the
//! host observer. The viewport is shrunk by
//! [`VISIBILITY_BOTTOM_MARGIN_PX`] at the bottom so the trigger fires
//! slightly before the element is fully scrolled into view.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use crate::host::{IntersectionEntry, IntersectionOptions, IntersectionSource, ObserverId};

/// Bottom viewport margin applied to every watch, in pixels.
pub const VISIBILITY_BOTTOM_MARGIN_PX: f64 = -50.0;

/// Slack for hosts that report ratios like `0.9999` for fully visible
/// elements.
const RATIO_EPSILON: f64 = 1e-3;

/// Watches elements for their first entry into the viewport.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityWatcher;

impl VisibilityWatcher {
    /// Calls `on_enter` once, the first time `element` is at least
    /// `threshold` visible.
    ///
    /// `threshold` is clamped to `[0, 1]`. If the element is detached,
    /// nothing is observed and the callback never fires.
    pub fn watch<E: 'static>(
        source: &Rc<dyn IntersectionSource<E>>,
        element: &E,
        threshold: f64,
        on_enter: impl FnOnce() + 'static,
    ) -> VisibilityWatch<E> {
        let threshold = clamp_threshold(threshold);
        let entry = Rc::new(ViewportEntry {
            threshold,
            has_fired: Cell::new(false),
            disposed: Cell::new(false),
            id: Cell::new(None),
            source: Rc::clone(source),
            on_enter: RefCell::new(Some(Box::new(on_enter))),
        });

        let options = IntersectionOptions {
            threshold,
            bottom_margin_px: VISIBILITY_BOTTOM_MARGIN_PX,
        };
        let forward = Rc::downgrade(&entry);
        let id = source.observe_intersection(
            element,
            options,
            Box::new(move |report| {
                if let Some(entry) = forward.upgrade() {
                    entry.deliver(report);
                }
            }),
        );

        match id {
            Some(id) => entry.id.set(Some(id)),
            None => entry.disposed.set(true),
        }

        VisibilityWatch { entry }
    }
}

fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        0.0
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

/// State of a single watch: fires at most once, then releases the observer.
struct ViewportEntry<E> {
    threshold: f64,
    has_fired: Cell<bool>,
    disposed: Cell<bool>,
    id: Cell<Option<ObserverId>>,
    source: Rc<dyn IntersectionSource<E>>,
    on_enter: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl<E> ViewportEntry<E> {
    fn deliver(&self, report: IntersectionEntry) {
        if self.disposed.get() || self.has_fired.get() {
            return;
        }
        if !report.is_intersecting || report.ratio + RATIO_EPSILON < self.threshold {
            return;
        }
        self.has_fired.set(true);
        self.release();
        let on_enter = self.on_enter.borrow_mut().take();
        if let Some(on_enter) = on_enter {
            on_enter();
        }
    }

    fn release(&self) {
        self.disposed.set(true);
        if let Some(id) = self.id.take() {
            self.source.unobserve_intersection(id);
        }
    }
}

/// Disposer for a [`VisibilityWatcher::watch`] call.
///
/// Dropping the watch disposes it.
#[must_use = "dropping a VisibilityWatch stops the observation"]
pub struct VisibilityWatch<E> {
    entry: Rc<ViewportEntry<E>>,
}

impl<E> VisibilityWatch<E> {
    /// Stops watching without firing. Idempotent.
    pub fn dispose(&self) {
        self.entry.release();
        self.entry.on_enter.borrow_mut().take();
    }

    /// Returns `true` once the threshold has been crossed.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.entry.has_fired.get()
    }

    /// Returns `true` while the host observer is attached.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.entry.disposed.get()
    }

    /// Returns the clamped threshold this watch uses.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.entry.threshold
    }
}

impl<E> Drop for VisibilityWatch<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<E> core::fmt::Debug for VisibilityWatch<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisibilityWatch")
            .field("threshold", &self.entry.threshold)
            .field("has_fired", &self.has_fired())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimElement, SimHost};
    use kurbo::Size;

    fn counting_watch(
        host: &SimHost,
        element: SimElement,
        threshold: f64,
    ) -> (VisibilityWatch<SimElement>, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        let env = host.environment();
        let watch = VisibilityWatcher::watch(&env.intersection, &element, threshold, move || {
            sink.set(sink.get() + 1);
        });
        (watch, count)
    }

    #[test]
    fn fires_once_when_threshold_reached() {
        let host = SimHost::new();
        let element = host.create_element(Size::new(100.0, 100.0));
        let (watch, count) = counting_watch(&host, element, 0.5);
        host.layout();

        host.set_visible_ratio(element, 0.2);
        assert_eq!(count.get(), 0, "below threshold");

        host.set_visible_ratio(element, 0.6);
        assert_eq!(count.get(), 1);
        assert!(watch.has_fired());
        assert!(!watch.is_active(), "observer released after firing");
        assert_eq!(host.active_intersection_observers(), 0);

        host.set_visible_ratio(element, 0.0);
        host.set_visible_ratio(element, 1.0);
        assert_eq!(count.get(), 1, "at most once");
    }

    #[test]
    fn requests_bottom_margin_bias() {
        let host = SimHost::new();
        let element = host.create_element(Size::new(10.0, 10.0));
        let (_watch, _count) = counting_watch(&host, element, 0.3);
        let options = host.intersection_options(element).unwrap();
        assert_eq!(options.threshold, 0.3);
        assert_eq!(options.bottom_margin_px, VISIBILITY_BOTTOM_MARGIN_PX);
    }

    #[test]
    fn already_visible_fires_after_layout() {
        let host = SimHost::new();
        let element = host.create_element(Size::new(10.0, 10.0));
        host.set_visible_ratio(element, 1.0);
        let (_watch, count) = counting_watch(&host, element, 1.0);
        assert_eq!(count.get(), 0, "never synchronously from watch()");
        host.layout();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dispose_before_crossing_never_fires() {
        let host = SimHost::new();
        let element = host.create_element(Size::new(10.0, 10.0));
        let (watch, count) = counting_watch(&host, element, 0.3);
        host.layout();

        watch.dispose();
        watch.dispose();
        assert_eq!(host.active_intersection_observers(), 0);

        host.set_visible_ratio(element, 1.0);
        assert_eq!(count.get(), 0);
        assert!(!watch.has_fired());
    }

    #[test]
    fn detached_element_never_fires() {
        let host = SimHost::new();
        let element = host.create_element(Size::new(10.0, 10.0));
        host.detach(element);
        let (watch, count) = counting_watch(&host, element, 0.0);
        assert!(!watch.is_active());
        host.set_visible_ratio(element, 1.0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn threshold_is_clamped() {
        let host = SimHost::new();
        let element = host.create_element(Size::new(10.0, 10.0));
        let (watch, _) = counting_watch(&host, element, 4.0);
        assert_eq!(watch.threshold(), 1.0);
        let (watch, _) = counting_watch(&host, element, f64::NAN);
        assert_eq!(watch.threshold(), 0.0);
    }
}
