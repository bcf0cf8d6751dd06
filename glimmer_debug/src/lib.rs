// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, logging, and Chrome trace export for glimmer
//! diagnostics.
//!
//! This crate provides [`TraceSink`](glimmer_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`] — time-stamped in-memory recording.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from a
//!   recording.
//! - [`log_sink::LogSink`] — forwards events to the `log` facade.

pub mod chrome;
pub mod log_sink;
pub mod pretty;
pub mod recorder;
