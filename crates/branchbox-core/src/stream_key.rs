// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Composite keys that output is buffered and fanned out under.

use serde::{Deserialize, Serialize};

/// Which backing process a stream key belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum StreamChannel {
	/// The branch's supervised development server
	Server,
	/// A named console session
	Console(String),
	/// Ad-hoc one-shot commands
	Task,
}

/// `(project, branch, channel)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamKey {
	pub project: String,
	pub branch: String,
	pub channel: StreamChannel,
}

impl StreamKey {
	pub fn server(project: impl Into<String>, branch: impl Into<String>) -> Self {
		Self {
			project: project.into(),
			branch: branch.into(),
			channel: StreamChannel::Server,
		}
	}

	pub fn console(
		project: impl Into<String>,
		branch: impl Into<String>,
		console_id: impl Into<String>,
	) -> Self {
		Self {
			project: project.into(),
			branch: branch.into(),
			channel: StreamChannel::Console(console_id.into()),
		}
	}

	pub fn task(project: impl Into<String>, branch: impl Into<String>) -> Self {
		Self {
			project: project.into(),
			branch: branch.into(),
			channel: StreamChannel::Task,
		}
	}

	/// Console keys are fed by polling; everything else by direct events.
	pub fn is_polled(&self) -> bool {
		matches!(self.channel, StreamChannel::Console(_))
	}
}

impl std::fmt::Display for StreamKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.channel {
			StreamChannel::Server => write!(f, "{}/{}:server", self.project, self.branch),
			StreamChannel::Console(id) => write!(f, "{}/{}:console:{id}", self.project, self.branch),
			StreamChannel::Task => write!(f, "{}/{}:task", self.project, self.branch),
		}
	}
}
