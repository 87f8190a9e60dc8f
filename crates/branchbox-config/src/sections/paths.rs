// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filesystem locations.

use std::path::PathBuf;

use serde::Deserialize;

/// `$XDG_DATA_HOME/branchbox`, or `./.branchbox` when no data dir is known.
pub fn default_data_dir() -> PathBuf {
	dirs::data_dir()
		.map(|dir| dir.join("branchbox"))
		.unwrap_or_else(|| PathBuf::from(".branchbox"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
	/// Holds `servers.json` and `consoles.json`.
	pub data_dir: PathBuf,
}

impl Default for PathsConfig {
	fn default() -> Self {
		PathsConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfigLayer {
	#[serde(default)]
	pub data_dir: Option<PathBuf>,
}

impl PathsConfigLayer {
	pub fn merge(&mut self, other: PathsConfigLayer) {
		if other.data_dir.is_some() {
			self.data_dir = other.data_dir;
		}
	}

	pub fn finalize(self) -> PathsConfig {
		PathsConfig {
			data_dir: self.data_dir.unwrap_or_else(default_data_dir),
		}
	}
}
