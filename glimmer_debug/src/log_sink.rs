// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forwards trace events to the [`log`] facade.
//!
//! Lifecycle events (phase changes, loop start/stop, geometry, inert mounts)
//! go out at `debug`; per-frame events at `trace`.

use glimmer_core::trace::{
    BorderFrameEvent, BorderGeometryEvent, FadePhaseEvent, InertMountEvent, LoopAction,
    LoopEvent, ParallaxFrameEvent, TraceSink,
};

use crate::pretty::{kind_name, suppression_name};

/// Log target used for every record.
pub const LOG_TARGET: &str = "glimmer";

/// A [`TraceSink`] that writes through whatever logger the application
/// installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn on_fade_phase(&mut self, e: &FadePhaseEvent) {
        log::debug!(target: LOG_TARGET, "fade {:?} -> {:?}", e.from, e.to);
    }

    fn on_loop(&mut self, e: &LoopEvent) {
        match e.action {
            LoopAction::Started => log::debug!(target: LOG_TARGET, "{} loop started", kind_name(e.kind)),
            LoopAction::Cancelled => {
                log::debug!(target: LOG_TARGET, "{} loop cancelled", kind_name(e.kind));
            }
        }
    }

    fn on_parallax_frame(&mut self, e: &ParallaxFrameEvent) {
        log::trace!(
            target: LOG_TARGET,
            "parallax frame={} scroll={} offset={} suppressed={}",
            e.frame_index,
            e.scroll_y,
            e.offset_y,
            e.suppressed.map_or("no", suppression_name),
        );
    }

    fn on_border_geometry(&mut self, e: &BorderGeometryEvent) {
        log::debug!(
            target: LOG_TARGET,
            "border geometry {}x{} length={}",
            e.width,
            e.height,
            e.path_length,
        );
    }

    fn on_border_frame(&mut self, e: &BorderFrameEvent) {
        log::trace!(
            target: LOG_TARGET,
            "border frame={} elapsed={:?} offset={}",
            e.frame_index,
            e.elapsed,
            e.dash_offset,
        );
    }

    fn on_inert_mount(&mut self, e: &InertMountEvent) {
        log::debug!(target: LOG_TARGET, "{} mounted inert: host APIs unavailable", kind_name(e.kind));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use glimmer_core::fade::FadePhase;
    use glimmer_core::trace::ControllerKind;
    use log::{Level, LevelFilter, Log, Metadata, Record};

    use super::*;

    static LINES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

    struct Capture;

    impl Log for Capture {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            metadata.target() == LOG_TARGET
        }

        fn log(&self, record: &Record<'_>) {
            if self.enabled(record.metadata())
                && let Ok(mut lines) = LINES.lock()
            {
                lines.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture;

    #[test]
    fn forwards_at_expected_levels() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(LevelFilter::Trace);

        let mut sink = LogSink;
        sink.on_fade_phase(&FadePhaseEvent {
            from: FadePhase::Waiting,
            to: FadePhase::Visible,
        });
        sink.on_inert_mount(&InertMountEvent {
            kind: ControllerKind::Parallax,
        });

        let lines = LINES.lock().unwrap();
        assert!(
            lines.contains(&(Level::Debug, "fade Waiting -> Visible".to_owned())),
            "{lines:?}"
        );
        assert!(
            lines.contains(&(
                Level::Debug,
                "parallax mounted inert: host APIs unavailable".to_owned()
            )),
            "{lines:?}"
        );
    }
}
