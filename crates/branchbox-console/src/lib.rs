// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named terminal sessions per branch, owned by an external multiplexer.
//!
//! Sessions outlive the orchestrator. [`ConsoleManager`] derives their names
//! deterministically, creates them on first use, injects commands, and keeps
//! a metadata registry that is reconciled against the multiplexer on list.
//! Output is observed by polling captures through the stream hub.

pub mod error;
pub mod manager;
pub mod memory;
pub mod multiplexer;
pub mod tmux;

pub use error::{MultiplexerError, Result};
pub use manager::{ConsoleManager, ConsoleOptions};
pub use memory::InMemoryMultiplexer;
pub use multiplexer::{KillOutcome, Multiplexer, MultiplexerCapture};
pub use tmux::TmuxMultiplexer;
