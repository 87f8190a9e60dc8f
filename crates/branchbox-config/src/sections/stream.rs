// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Live output fan-out settings.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_BUFFER_CAPACITY: usize = 1_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
	/// Ring buffer entries kept per stream key.
	pub buffer_capacity: usize,
	/// Interval between console captures.
	pub poll_interval: Duration,
}

impl Default for StreamConfig {
	fn default() -> Self {
		StreamConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamConfigLayer {
	#[serde(default)]
	pub buffer_capacity: Option<usize>,
	#[serde(default)]
	pub poll_interval_ms: Option<u64>,
}

impl StreamConfigLayer {
	pub fn merge(&mut self, other: StreamConfigLayer) {
		if other.buffer_capacity.is_some() {
			self.buffer_capacity = other.buffer_capacity;
		}
		if other.poll_interval_ms.is_some() {
			self.poll_interval_ms = other.poll_interval_ms;
		}
	}

	pub fn finalize(self) -> StreamConfig {
		StreamConfig {
			buffer_capacity: self.buffer_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY),
			poll_interval: Duration::from_millis(
				self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
			),
		}
	}
}
