// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::sections::{
	ConsoleConfigLayer, HttpConfigLayer, LoggingConfigLayer, PathsConfigLayer, StreamConfigLayer,
	SupervisorConfigLayer,
};

/// Every field is optional; later layers override earlier ones field by field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchboxConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub paths: Option<PathsConfigLayer>,
	#[serde(default)]
	pub supervisor: Option<SupervisorConfigLayer>,
	#[serde(default)]
	pub stream: Option<StreamConfigLayer>,
	#[serde(default)]
	pub console: Option<ConsoleConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	/// Project id to repository path. Entries from later layers replace same-named ones.
	#[serde(default)]
	pub projects: BTreeMap<String, PathBuf>,
}

impl BranchboxConfigLayer {
	pub fn merge(&mut self, other: BranchboxConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(&mut self.paths, other.paths, PathsConfigLayer::merge);
		merge_option(
			&mut self.supervisor,
			other.supervisor,
			SupervisorConfigLayer::merge,
		);
		merge_option(&mut self.stream, other.stream, StreamConfigLayer::merge);
		merge_option(&mut self.console, other.console, ConsoleConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		self.projects.extend(other.projects);
	}
}

fn merge_option<T>(target: &mut Option<T>, source: Option<T>, merge: fn(&mut T, T)) {
	match (target.as_mut(), source) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *target = Some(incoming),
		(_, None) => {}
	}
}
