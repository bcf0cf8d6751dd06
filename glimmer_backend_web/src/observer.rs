// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `ResizeObserver` and `IntersectionObserver` ports.
//!
//! Every observation gets its own browser observer, disconnected when the
//! observation ends. Sizes are read with `getBoundingClientRect`, so they
//! include padding and border.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::cell::{Cell, RefCell};

use hashbrown::HashMap;
use js_sys::Array;
use kurbo::Size;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{
    Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    ResizeObserver, ResizeObserverEntry,
};

use glimmer_core::host::{
    IntersectionEntry, IntersectionOptions, IntersectionSource, ObserverId, ResizeSource,
};

type EntriesClosure = Closure<dyn FnMut(Array)>;

/// CSS `rootMargin` that shifts only the bottom edge of the viewport.
#[must_use]
pub fn root_margin(bottom_margin_px: f64) -> String {
    format!("0px 0px {bottom_margin_px}px 0px")
}

struct Ids(Cell<u64>);

impl Ids {
    fn next(&self) -> ObserverId {
        let id = self.0.get();
        self.0.set(id + 1);
        ObserverId(id)
    }
}

/// [`ResizeSource`] backed by one `ResizeObserver` per observation.
pub struct DomResizeSource {
    ids: Ids,
    live: RefCell<HashMap<ObserverId, (ResizeObserver, EntriesClosure)>>,
}

impl Default for DomResizeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DomResizeSource {
    /// Creates a source with no observations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: Ids(Cell::new(1)),
            live: RefCell::new(HashMap::new()),
        }
    }
}

impl ResizeSource<Element> for DomResizeSource {
    fn observe_size(&self, element: &Element, mut callback: Box<dyn FnMut(Size)>) -> Option<ObserverId> {
        if !element.is_connected() {
            return None;
        }
        let closure: EntriesClosure = Closure::new(move |entries: Array| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<ResizeObserverEntry>() else {
                    continue;
                };
                let rect = entry.target().get_bounding_client_rect();
                callback(Size::new(rect.width(), rect.height()));
            }
        });
        let observer = match ResizeObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                log::warn!("ResizeObserver construction failed: {err:?}");
                return None;
            }
        };
        observer.observe(element);

        let id = self.ids.next();
        self.live.borrow_mut().insert(id, (observer, closure));
        Some(id)
    }

    fn unobserve_size(&self, id: ObserverId) {
        let removed = self.live.borrow_mut().remove(&id);
        if let Some((observer, _closure)) = removed {
            observer.disconnect();
        }
    }
}

impl Drop for DomResizeSource {
    fn drop(&mut self) {
        for (_, (observer, _)) in self.live.borrow_mut().drain() {
            observer.disconnect();
        }
    }
}

impl core::fmt::Debug for DomResizeSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomResizeSource")
            .field("live", &self.live.borrow().len())
            .finish_non_exhaustive()
    }
}

/// [`IntersectionSource`] backed by one `IntersectionObserver` per
/// observation, rooted at the viewport.
pub struct DomIntersectionSource {
    ids: Ids,
    live: RefCell<HashMap<ObserverId, (IntersectionObserver, EntriesClosure)>>,
}

impl Default for DomIntersectionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DomIntersectionSource {
    /// Creates a source with no observations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: Ids(Cell::new(1)),
            live: RefCell::new(HashMap::new()),
        }
    }
}

impl IntersectionSource<Element> for DomIntersectionSource {
    fn observe_intersection(
        &self,
        element: &Element,
        options: IntersectionOptions,
        mut callback: Box<dyn FnMut(IntersectionEntry)>,
    ) -> Option<ObserverId> {
        if !element.is_connected() {
            return None;
        }
        let closure: EntriesClosure = Closure::new(move |entries: Array| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                callback(IntersectionEntry {
                    is_intersecting: entry.is_intersecting(),
                    ratio: entry.intersection_ratio(),
                });
            }
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&root_margin(options.bottom_margin_px));
        let observer =
            match IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init) {
                Ok(observer) => observer,
                Err(err) => {
                    log::warn!("IntersectionObserver construction failed: {err:?}");
                    return None;
                }
            };
        observer.observe(element);

        let id = self.ids.next();
        self.live.borrow_mut().insert(id, (observer, closure));
        Some(id)
    }

    fn unobserve_intersection(&self, id: ObserverId) {
        let removed = self.live.borrow_mut().remove(&id);
        if let Some((observer, _closure)) = removed {
            observer.disconnect();
        }
    }
}

impl Drop for DomIntersectionSource {
    fn drop(&mut self) {
        for (_, (observer, _)) in self.live.borrow_mut().drain() {
            observer.disconnect();
        }
    }
}

impl core::fmt::Debug for DomIntersectionSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomIntersectionSource")
            .field("live", &self.live.borrow().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_margin_shifts_bottom_edge_only() {
        assert_eq!(root_margin(-50.0), "0px 0px -50px 0px");
        assert_eq!(root_margin(0.0), "0px 0px 0px 0px");
        assert_eq!(root_margin(12.5), "0px 0px 12.5px 0px");
    }
}
