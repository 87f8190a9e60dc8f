// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types shared by the branchbox orchestration crates.
//!
//! This crate provides:
//! - [`ServerProcess`] / [`ServerStatus`] - durable record of one dev server per branch
//! - [`ConsoleSession`] and [`session_name`] - externally persisted terminal sessions
//! - [`LogEntry`] / [`StreamEvent`] - observable output units fanned out to viewers
//! - [`StreamKey`] - the `(project, branch, channel)` key output is buffered under
//! - [`OrchestratorError`] - the error taxonomy returned to callers

pub mod error;
pub mod log;
pub mod server;
pub mod session;
pub mod stream_key;

pub use error::{OrchestratorError, Result};
pub use log::{LogEntry, LogKind, RefreshEvent, StreamEvent};
pub use server::{ServerProcess, ServerStatus};
pub use session::{session_name, ConsoleSession, DEFAULT_CONSOLE_ID, MAX_SESSION_NAME_LEN};
pub use stream_key::{StreamChannel, StreamKey};
