// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] writes events recorded by a
//! [`RecorderSink`](super::recorder::RecorderSink) as [Chrome Trace Event
//! Format][spec] JSON. Each controller kind gets its own track; loop
//! lifetimes become duration slices and per-frame values become counters.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use glimmer_core::trace::{ControllerKind, LoopAction};

use crate::pretty::{kind_name, suppression_name};
use crate::recorder::{RecordedEvent, Stamped};

fn track(kind: ControllerKind) -> u32 {
    match kind {
        ControllerKind::Fade => 1,
        ControllerKind::Parallax => 2,
        ControllerKind::MovingBorder => 3,
    }
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are the recorded microsecond ticks.
pub fn export(events: &[Stamped], writer: &mut dyn Write) -> io::Result<()> {
    let values: Vec<Value> = events.iter().map(to_value).collect();
    serde_json::to_writer_pretty(&mut *writer, &values)?;
    writer.write_all(b"\n")
}

fn to_value(stamped: &Stamped) -> Value {
    let ts = stamped.at.ticks();
    match stamped.event {
        RecordedEvent::FadePhase(e) => json!({
            "ph": "i",
            "name": "FadePhase",
            "cat": "Fade",
            "ts": ts,
            "pid": 0,
            "tid": track(ControllerKind::Fade),
            "s": "t",
            "args": {
                "from": format!("{:?}", e.from),
                "to": format!("{:?}", e.to),
            }
        }),
        RecordedEvent::Loop(e) => {
            let ph = match e.action {
                LoopAction::Started => "B",
                LoopAction::Cancelled => "E",
            };
            json!({
                "ph": ph,
                "name": format!("{} loop", kind_name(e.kind)),
                "cat": "Loop",
                "ts": ts,
                "pid": 0,
                "tid": track(e.kind),
            })
        }
        RecordedEvent::ParallaxFrame(e) => json!({
            "ph": "C",
            "name": "parallax offset",
            "cat": "Parallax",
            "ts": ts,
            "pid": 0,
            "tid": track(ControllerKind::Parallax),
            "args": {
                "offset_y": e.offset_y,
                "scroll_y": e.scroll_y,
                "suppressed": e.suppressed.map(suppression_name),
            }
        }),
        RecordedEvent::BorderGeometry(e) => json!({
            "ph": "i",
            "name": "BorderGeometry",
            "cat": "Border",
            "ts": ts,
            "pid": 0,
            "tid": track(ControllerKind::MovingBorder),
            "s": "t",
            "args": {
                "width": e.width,
                "height": e.height,
                "path_length": e.path_length,
            }
        }),
        RecordedEvent::BorderFrame(e) => json!({
            "ph": "C",
            "name": "dash offset",
            "cat": "Border",
            "ts": ts,
            "pid": 0,
            "tid": track(ControllerKind::MovingBorder),
            "args": {
                "dash_offset": e.dash_offset,
                "frame_index": e.frame_index,
            }
        }),
        RecordedEvent::InertMount(e) => json!({
            "ph": "i",
            "name": "InertMount",
            "cat": "Lifecycle",
            "ts": ts,
            "pid": 0,
            "tid": track(e.kind),
            "s": "g",
            "args": {
                "kind": kind_name(e.kind),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use glimmer_core::time::{Duration, HostTime};
    use glimmer_core::trace::{BorderFrameEvent, LoopEvent};

    use super::*;

    #[test]
    fn exports_valid_json_array() {
        let events = [
            Stamped {
                at: HostTime(16_000),
                event: RecordedEvent::Loop(LoopEvent {
                    kind: ControllerKind::MovingBorder,
                    action: LoopAction::Started,
                }),
            },
            Stamped {
                at: HostTime(32_000),
                event: RecordedEvent::BorderFrame(BorderFrameEvent {
                    frame_index: 1,
                    elapsed: Duration::from_millis(16),
                    dash_offset: -2.5,
                }),
            },
        ];
        let mut out = Vec::new();
        export(&events, &mut out).unwrap();

        let parsed: Value = serde_json::from_slice(&out).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["ph"], "B");
        assert_eq!(array[0]["name"], "border loop");
        assert_eq!(array[0]["tid"], 3);
        assert_eq!(array[1]["ph"], "C");
        assert_eq!(array[1]["ts"], 32_000);
        assert_eq!(array[1]["args"]["dash_offset"], -2.5);
    }

    #[test]
    fn empty_recording_is_empty_array() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, json!([]));
    }
}
