// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Global window reads: reduced motion, scroll offset, viewport width.

use glimmer_core::host::{MotionPreference, ScrollSource, ViewportSource};
use web_sys::Window;

/// Media query for the reduced-motion accessibility setting.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Reads live window state. Every call queries the browser; nothing is
/// cached.
#[derive(Debug, Clone)]
pub struct WindowState {
    window: Window,
}

impl WindowState {
    /// Wraps a window.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl MotionPreference for WindowState {
    fn prefers_reduced_motion(&self) -> bool {
        match self.window.match_media(REDUCED_MOTION_QUERY) {
            Ok(Some(list)) => list.matches(),
            Ok(None) => false,
            Err(err) => {
                log::debug!("matchMedia failed: {err:?}");
                false
            }
        }
    }
}

impl ScrollSource for WindowState {
    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }
}

impl ViewportSource for WindowState {
    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0)
    }
}
