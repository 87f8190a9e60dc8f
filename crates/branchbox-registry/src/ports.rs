// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Advisory port allocation over the server registry.
//!
//! Allocation does not reserve anything: two concurrent starts can pick the
//! same port before either record is persisted.

use std::collections::BTreeSet;

use crate::records::ServerMap;
use crate::store::ServerRegistry;

/// Ports claimed by starting or running servers across all projects.
pub fn active_ports(map: &ServerMap) -> BTreeSet<u16> {
	map.values()
		.flatten()
		.filter(|s| s.is_active())
		.map(|s| s.port)
		.collect()
}

/// Smallest port `>= base` not claimed by an active server.
///
/// Returns `None` only when every port from `base` to `u16::MAX` is taken.
pub fn next_free_port(map: &ServerMap, base: u16) -> Option<u16> {
	let in_use = active_ports(map);
	(base..=u16::MAX).find(|port| !in_use.contains(port))
}

impl ServerRegistry {
	pub async fn next_free_port(&self, base: u16) -> Option<u16> {
		next_free_port(&self.load().await, base)
	}
}
