// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Result, WorktreeError};
use crate::resolver::WorktreeResolver;

/// Resolver backed by an explicit table, for tests and single-checkout setups.
#[derive(Clone, Default)]
pub struct FixedWorktreeResolver {
	entries: Arc<Mutex<HashMap<(String, String), PathBuf>>>,
}

impl FixedWorktreeResolver {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(self, project: &str, branch: &str, path: impl AsRef<Path>) -> Self {
		self.insert(project, branch, path);
		self
	}

	pub fn insert(&self, project: &str, branch: &str, path: impl AsRef<Path>) {
		self.entries.lock().insert(
			(project.to_string(), branch.to_string()),
			path.as_ref().to_path_buf(),
		);
	}
}

#[async_trait]
impl WorktreeResolver for FixedWorktreeResolver {
	async fn resolve(&self, project: &str, branch: &str) -> Result<PathBuf> {
		let found = self
			.entries
			.lock()
			.get(&(project.to_string(), branch.to_string()))
			.cloned();
		found.ok_or_else(|| WorktreeError::BranchNotFound {
			project: project.to_string(),
			branch: branch.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_resolves_only_known_pairs() {
		let resolver = FixedWorktreeResolver::new().with("acme", "main", "/srv/acme");
		assert_eq!(
			resolver.resolve("acme", "main").await.unwrap(),
			PathBuf::from("/srv/acme")
		);
		assert!(matches!(
			resolver.resolve("acme", "feature-x").await,
			Err(WorktreeError::BranchNotFound { .. })
		));
	}

	#[tokio::test]
	async fn test_clones_share_inserts() {
		let resolver = FixedWorktreeResolver::new();
		let handle = resolver.clone();
		handle.insert("acme", "feature-x", "/srv/acme-feature-x");
		assert_eq!(
			resolver.resolve("acme", "feature-x").await.unwrap(),
			PathBuf::from("/srv/acme-feature-x")
		);

		handle.insert("acme", "feature-x", "/srv/moved");
		assert_eq!(
			resolver.resolve("acme", "feature-x").await.unwrap(),
			PathBuf::from("/srv/moved")
		);
	}
}
