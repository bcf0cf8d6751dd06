// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for glimmer.
//!
//! This crate implements the `glimmer_core` host ports with browser APIs and
//! applies controller output to the DOM:
//!
//! - [`RafFrames`], [`WindowTimers`]: `requestAnimationFrame` and `setTimeout`
//! - [`WindowState`]: `matchMedia`, `scrollY`, `innerWidth`
//! - [`DomResizeSource`], [`DomIntersectionSource`]: `ResizeObserver` and
//!   `IntersectionObserver`
//! - [`FadePresenter`], [`ParallaxPresenter`], [`SvgRectStroke`]: style and
//!   attribute writers
//!
//! [`web_environment`] bundles the ports into an
//! [`Environment`](glimmer_core::host::Environment).

#![no_std]

extern crate alloc;

mod observer;
mod presenter;
mod raf;
mod window;

pub use observer::{DomIntersectionSource, DomResizeSource, root_margin};
pub use presenter::{
    FadePresenter, ParallaxPresenter, SvgRectStroke, blur_filter_css, dasharray_attr,
    fade_transition_css, outline_attrs, parallax_transform_css, stroke_filter_attr,
    translate_css,
};
pub use raf::{RafFrames, WindowTimers};
pub use window::{REDUCED_MOTION_QUERY, WindowState};

use alloc::rc::Rc;

use glimmer_core::host::Environment;
use glimmer_core::time::HostTime;
use wasm_bindgen::JsValue;
use web_sys::Element;

/// Globals every controller relies on.
const REQUIRED_GLOBALS: [&str; 2] = ["ResizeObserver", "IntersectionObserver"];

/// Returns the current host time from `performance.now()`, in microsecond
/// ticks.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}

/// Builds an environment from the current window.
///
/// Without a window (a worker, or server-side rendering) or without the
/// observer APIs, the environment is unavailable and every mount yields an
/// inert handle.
#[must_use]
pub fn web_environment() -> Environment<Element> {
    let Some(window) = web_sys::window() else {
        log::debug!("no window; controllers will be inert");
        return Environment::unavailable();
    };
    for name in REQUIRED_GLOBALS {
        let present = js_sys::Reflect::has(&window, &JsValue::from_str(name)).unwrap_or(false);
        if !present {
            log::warn!("{name} is not supported; controllers will be inert");
            return Environment::unavailable();
        }
    }

    let state = Rc::new(WindowState::new(window));
    Environment::new(
        Rc::new(RafFrames::new()),
        Rc::new(WindowTimers::new()),
        state.clone(),
        state.clone(),
        state,
        Rc::new(DomResizeSource::new()),
        Rc::new(DomIntersectionSource::new()),
    )
}
