// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process fan-out of output to live viewers.
//!
//! Every [`StreamKey`](branchbox_core::StreamKey) is owned by one actor task
//! fed through an unbounded channel. The actor holds the ring buffer, the
//! subscriber set, and (for console keys) the last polled capture, so
//! producers never touch subscriber state directly.
//!
//! Two delivery strategies share the actor:
//! - direct events: [`StreamHub::publish`] appends to the ring buffer and
//!   forwards to every subscriber
//! - polling-diff: a poller snapshots a [`CaptureSource`] on an interval and
//!   the actor turns consecutive captures into appended lines or a full
//!   refresh (see [`diff_capture`])
//!
//! New subscribers first receive a replay (buffered entries, or the last
//! capture for polled keys) before any live record.

mod actor;
pub mod capture;
pub mod diff;
pub mod hub;
pub mod subscription;

pub use capture::{CaptureError, CaptureSource};
pub use diff::{diff_capture, normalize_capture, CaptureDelta};
pub use hub::{HubConfig, KeyStats, StreamHub, DEFAULT_BUFFER_CAPACITY, DEFAULT_POLL_INTERVAL};
pub use subscription::Subscription;
