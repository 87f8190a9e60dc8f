// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use branchbox_stream::{CaptureError, CaptureSource};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of a kill request.
///
/// Killing an absent session is not an error, but callers can tell it apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillOutcome {
	Killed,
	NotFound,
}

/// An external service owning persistent terminal sessions.
#[async_trait]
pub trait Multiplexer: Send + Sync {
	async fn has_session(&self, name: &str) -> Result<bool>;

	/// Create a detached session rooted at `cwd`. An already existing
	/// session of that name counts as success.
	async fn new_session(&self, name: &str, cwd: &Path) -> Result<()>;

	/// Type `text` literally, then press Enter.
	async fn send_keys(&self, name: &str, text: &str) -> Result<()>;

	async fn kill_session(&self, name: &str) -> Result<KillOutcome>;

	/// Names of all live sessions; empty when the service is not running.
	async fn list_sessions(&self) -> Result<Vec<String>>;

	/// Visible pane plus scrollback as plain text.
	async fn capture(&self, name: &str) -> Result<String>;
}

/// Exposes a multiplexer's captures to the stream hub's poller.
#[derive(Clone)]
pub struct MultiplexerCapture {
	mux: Arc<dyn Multiplexer>,
}

impl MultiplexerCapture {
	pub fn new(mux: Arc<dyn Multiplexer>) -> Self {
		Self { mux }
	}
}

#[async_trait]
impl CaptureSource for MultiplexerCapture {
	async fn capture(&self, session: &str) -> std::result::Result<String, CaptureError> {
		self.mux.capture(session).await.map_err(|e| CaptureError {
			session: session.to_string(),
			message: e.to_string(),
		})
	}
}
