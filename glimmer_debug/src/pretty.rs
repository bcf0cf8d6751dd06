// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use glimmer_core::parallax::Suppression;
use glimmer_core::trace::{
    BorderFrameEvent, BorderGeometryEvent, ControllerKind, FadePhaseEvent, InertMountEvent,
    LoopAction, LoopEvent, ParallaxFrameEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn kind_name(kind: ControllerKind) -> &'static str {
    match kind {
        ControllerKind::Fade => "fade",
        ControllerKind::Parallax => "parallax",
        ControllerKind::MovingBorder => "border",
    }
}

pub(crate) fn suppression_name(reason: Suppression) -> &'static str {
    match reason {
        Suppression::Disabled => "disabled",
        Suppression::ReducedMotion => "reduced-motion",
        Suppression::NarrowViewport => "narrow-viewport",
        Suppression::Unavailable => "unavailable",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_fade_phase(&mut self, e: &FadePhaseEvent) {
        let _ = writeln!(self.writer, "[fade] {:?} -> {:?}", e.from, e.to);
    }

    fn on_loop(&mut self, e: &LoopEvent) {
        let action = match e.action {
            LoopAction::Started => "started",
            LoopAction::Cancelled => "cancelled",
        };
        let _ = writeln!(self.writer, "[loop] {} {action}", kind_name(e.kind));
    }

    fn on_parallax_frame(&mut self, e: &ParallaxFrameEvent) {
        match e.suppressed {
            Some(reason) => {
                let _ = writeln!(
                    self.writer,
                    "[parallax] frame={} scroll={:.1} suppressed={}",
                    e.frame_index,
                    e.scroll_y,
                    suppression_name(reason),
                );
            }
            None => {
                let _ = writeln!(
                    self.writer,
                    "[parallax] frame={} scroll={:.1} offset={:.1}",
                    e.frame_index, e.scroll_y, e.offset_y,
                );
            }
        }
    }

    fn on_border_geometry(&mut self, e: &BorderGeometryEvent) {
        let _ = writeln!(
            self.writer,
            "[border:geometry] {:.1}x{:.1} length={:.2}",
            e.width, e.height, e.path_length,
        );
    }

    fn on_border_frame(&mut self, e: &BorderFrameEvent) {
        let _ = writeln!(
            self.writer,
            "[border] frame={} elapsed={:.1}ms offset={:.2}",
            e.frame_index,
            e.elapsed.as_millis_f64(),
            e.dash_offset,
        );
    }

    fn on_inert_mount(&mut self, e: &InertMountEvent) {
        let _ = writeln!(self.writer, "[inert] {}", kind_name(e.kind));
    }
}

#[cfg(test)]
mod tests {
    use glimmer_core::fade::FadePhase;
    use glimmer_core::time::Duration;

    use super::*;

    fn output(f: impl FnOnce(&mut PrettyPrintSink<Vec<u8>>)) -> String {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        f(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn one_line_per_event() {
        let text = output(|sink| {
            sink.on_fade_phase(&FadePhaseEvent {
                from: FadePhase::Pending,
                to: FadePhase::Visible,
            });
            sink.on_loop(&LoopEvent {
                kind: ControllerKind::MovingBorder,
                action: LoopAction::Started,
            });
            sink.on_border_frame(&BorderFrameEvent {
                frame_index: 3,
                elapsed: Duration::from_millis(1000),
                dash_offset: -200.0,
            });
        });
        assert_eq!(
            text,
            "[fade] Pending -> Visible\n\
             [loop] border started\n\
             [border] frame=3 elapsed=1000.0ms offset=-200.00\n"
        );
    }

    #[test]
    fn suppressed_parallax_names_reason() {
        let text = output(|sink| {
            sink.on_parallax_frame(&ParallaxFrameEvent {
                frame_index: 0,
                scroll_y: 1000.0,
                offset_y: 0.0,
                suppressed: Some(Suppression::NarrowViewport),
            });
        });
        assert_eq!(text, "[parallax] frame=0 scroll=1000.0 suppressed=narrow-viewport\n");
    }
}
