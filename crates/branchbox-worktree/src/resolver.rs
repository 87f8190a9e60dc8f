// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

/// Maps a branch of a project to its checkout directory.
#[async_trait]
pub trait WorktreeResolver: Send + Sync {
	/// Absolute path of the worktree for `branch`, or
	/// [`WorktreeError::BranchNotFound`](crate::WorktreeError::BranchNotFound).
	async fn resolve(&self, project: &str, branch: &str) -> Result<PathBuf>;
}
