// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Output heuristics deciding when a starting server is up.

use branchbox_core::ServerStatus;

/// Lowercased stdout substrings that mean the dev server is serving traffic.
pub const READY_MARKERS: [&str; 3] = ["ready", "started", "localhost"];

/// Case-sensitive stderr substring that fails a server still starting.
pub const ERROR_MARKER: &str = "Error";

pub fn is_ready_line(line: &str) -> bool {
	let line = line.to_lowercase();
	READY_MARKERS.iter().any(|marker| line.contains(marker))
}

pub fn is_error_line(line: &str) -> bool {
	line.contains(ERROR_MARKER)
}

/// Decides the single transition out of `starting`.
///
/// Each `on_*` method returns the new status the first time a signal fires,
/// then `None` forever.
#[derive(Debug, Default)]
pub struct ReadinessClassifier {
	decided: bool,
}

impl ReadinessClassifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_pending(&self) -> bool {
		!self.decided
	}

	pub fn on_stdout(&mut self, line: &str) -> Option<ServerStatus> {
		self.decide(is_ready_line(line), ServerStatus::Running)
	}

	pub fn on_stderr(&mut self, line: &str) -> Option<ServerStatus> {
		self.decide(is_error_line(line), ServerStatus::Error)
	}

	/// Nothing matched within the grace window: assume it is up.
	pub fn on_grace_elapsed(&mut self) -> Option<ServerStatus> {
		self.decide(true, ServerStatus::Running)
	}

	fn decide(&mut self, fired: bool, status: ServerStatus) -> Option<ServerStatus> {
		if self.decided || !fired {
			return None;
		}
		self.decided = true;
		Some(status)
	}
}
