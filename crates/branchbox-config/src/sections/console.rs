// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Terminal multiplexer settings.

use serde::Deserialize;

const DEFAULT_TMUX: &str = "tmux";
const DEFAULT_SESSION_PREFIX: &str = "bbx-";
const DEFAULT_HISTORY_LINES: u32 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
	pub tmux_binary: String,
	pub session_prefix: String,
	/// Scrollback kept by each session and included in captures.
	pub history_lines: u32,
}

impl Default for ConsoleConfig {
	fn default() -> Self {
		ConsoleConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsoleConfigLayer {
	#[serde(default)]
	pub tmux_binary: Option<String>,
	#[serde(default)]
	pub session_prefix: Option<String>,
	#[serde(default)]
	pub history_lines: Option<u32>,
}

impl ConsoleConfigLayer {
	pub fn merge(&mut self, other: ConsoleConfigLayer) {
		if other.tmux_binary.is_some() {
			self.tmux_binary = other.tmux_binary;
		}
		if other.session_prefix.is_some() {
			self.session_prefix = other.session_prefix;
		}
		if other.history_lines.is_some() {
			self.history_lines = other.history_lines;
		}
	}

	pub fn finalize(self) -> ConsoleConfig {
		ConsoleConfig {
			tmux_binary: self.tmux_binary.unwrap_or_else(|| DEFAULT_TMUX.to_string()),
			session_prefix: self
				.session_prefix
				.unwrap_or_else(|| DEFAULT_SESSION_PREFIX.to_string()),
			history_lines: self.history_lines.unwrap_or(DEFAULT_HISTORY_LINES),
		}
	}
}
