// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dev server supervision settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_BASE_PORT: u16 = 3100;
const DEFAULT_READINESS_GRACE_MS: u64 = 5_000;
const DEFAULT_COMMAND: &str = "npm run dev";
const DEFAULT_BIND_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
	pub base_port: u16,
	pub readiness_grace: Duration,
	pub default_command: String,
	pub bind_host: String,
	/// Added to `PATH` in front of the built-in toolchain directories.
	pub extra_path: Vec<PathBuf>,
}

impl Default for SupervisorConfig {
	fn default() -> Self {
		SupervisorConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupervisorConfigLayer {
	#[serde(default)]
	pub base_port: Option<u16>,
	#[serde(default)]
	pub readiness_grace_ms: Option<u64>,
	#[serde(default)]
	pub default_command: Option<String>,
	#[serde(default)]
	pub bind_host: Option<String>,
	#[serde(default)]
	pub extra_path: Option<Vec<PathBuf>>,
}

impl SupervisorConfigLayer {
	pub fn merge(&mut self, other: SupervisorConfigLayer) {
		if other.base_port.is_some() {
			self.base_port = other.base_port;
		}
		if other.readiness_grace_ms.is_some() {
			self.readiness_grace_ms = other.readiness_grace_ms;
		}
		if other.default_command.is_some() {
			self.default_command = other.default_command;
		}
		if other.bind_host.is_some() {
			self.bind_host = other.bind_host;
		}
		if other.extra_path.is_some() {
			self.extra_path = other.extra_path;
		}
	}

	pub fn finalize(self) -> SupervisorConfig {
		SupervisorConfig {
			base_port: self.base_port.unwrap_or(DEFAULT_BASE_PORT),
			readiness_grace: Duration::from_millis(
				self.readiness_grace_ms.unwrap_or(DEFAULT_READINESS_GRACE_MS),
			),
			default_command: self
				.default_command
				.unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
			bind_host: self.bind_host.unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
			extra_path: self.extra_path.unwrap_or_default(),
		}
	}
}
