// Copyright 2026 the Glimmer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame, viewport, and geometry driven animation controllers.
//!
//! `glimmer_core` drives the motion primitives of a design-system view layer:
//! fade-on-enter reveals, scroll-linked parallax, and a lit segment that
//! travels around a button's pill-shaped border. It is `no_std` compatible
//! (with `alloc`) and never touches a real browser; every host capability is
//! reached through the ports in [`host`].
//!
//! # Architecture
//!
//! ```text
//!   Environment (host ports)
//!       │
//!       ├──► VisibilityWatcher ──► FadeController ──► FadeStyle
//!       │
//!       ├──► FrameClock ──► ParallaxController ──► ParallaxTransform
//!       │
//!       └──► GeometryWatcher ─┐
//!            FrameClock ──────┴──► MovingBorderAnimator ──► StrokeTarget × 2
//! ```
//!
//! **[`host`]** — Capability traits (frames, timers, reduced motion, scroll,
//! viewport width, resize and intersection observation) bundled in an
//! [`Environment`](host::Environment).
//!
//! **[`clock`]** — [`FrameClock`](clock::FrameClock) turns one-shot frame
//! requests into cancellable per-frame loops.
//!
//! **[`geometry`]** and **[`visibility`]** — Per-element size and viewport
//! entry observation with explicit disposal.
//!
//! **[`fade`]**, **[`parallax`]**, **[`border`]** — The three controllers.
//! Each `mount` returns a handle; dropping it disposes every registration the
//! controller made.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) hooks for controller
//! lifecycles, zero-cost unless the `trace` feature is on.
//!
//! **[`sim`]** — A deterministic in-memory host for tests and headless tools.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod border;
pub mod clock;
pub mod fade;
pub mod geometry;
pub mod host;
pub mod parallax;
pub mod sim;
pub mod time;
pub mod trace;
pub mod visibility;
