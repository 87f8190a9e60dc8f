// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::error::{Result, WorktreeError};
use crate::resolver::WorktreeResolver;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// One record of `git worktree list --porcelain`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeEntry {
	pub path: PathBuf,
	pub head: Option<String>,
	/// Short branch name, without `refs/heads/`.
	pub branch: Option<String>,
	pub bare: bool,
	pub detached: bool,
}

/// Parse porcelain worktree output into entries, in listing order.
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeEntry> {
	let mut entries = Vec::new();
	let mut current: Option<WorktreeEntry> = None;

	for line in output.lines() {
		let line = line.trim_end();
		if line.is_empty() {
			entries.extend(current.take());
			continue;
		}

		let (label, value) = line.split_once(' ').unwrap_or((line, ""));
		if label == "worktree" {
			entries.extend(current.take());
			current = Some(WorktreeEntry {
				path: PathBuf::from(value),
				..Default::default()
			});
			continue;
		}

		let Some(entry) = current.as_mut() else {
			continue;
		};
		match label {
			"HEAD" => entry.head = Some(value.to_string()),
			"branch" => {
				entry.branch = Some(value.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(value).to_string())
			}
			"bare" => entry.bare = true,
			"detached" => entry.detached = true,
			_ => {}
		}
	}
	entries.extend(current);
	entries
}

/// Resolves worktrees by asking git, given a project id to repository map.
pub struct GitWorktreeResolver {
	projects: BTreeMap<String, PathBuf>,
	git: String,
}

impl GitWorktreeResolver {
	pub fn new(projects: BTreeMap<String, PathBuf>) -> Self {
		Self {
			projects,
			git: "git".to_string(),
		}
	}

	#[must_use]
	pub fn with_git_binary(mut self, git: impl Into<String>) -> Self {
		self.git = git.into();
		self
	}

	pub fn repository(&self, project: &str) -> Result<&Path> {
		self.projects
			.get(project)
			.map(PathBuf::as_path)
			.ok_or_else(|| WorktreeError::UnknownProject(project.to_string()))
	}

	pub async fn list(&self, project: &str) -> Result<Vec<WorktreeEntry>> {
		let repo = self.repository(project)?;
		let output = self.run_git(repo, &["worktree", "list", "--porcelain"]).await?;
		Ok(parse_worktree_list(&output))
	}

	async fn run_git(&self, path: &Path, args: &[&str]) -> Result<String> {
		let mut cmd = Command::new(&self.git);
		cmd.arg("-C").arg(path).args(args);

		trace!(
				cmd = %format!("{} -C {} {}", self.git, path.display(), args.join(" ")),
				"running git command"
		);

		let output = cmd.output().await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				warn!(git = %self.git, "git not found in PATH");
				WorktreeError::GitNotInstalled
			} else {
				WorktreeError::Io(e)
			}
		})?;

		if output.status.success() {
			Ok(String::from_utf8_lossy(&output.stdout).into_owned())
		} else {
			Err(WorktreeError::CommandFailed {
				cmd: "git",
				args: args.iter().map(|s| s.to_string()).collect(),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			})
		}
	}
}

#[async_trait]
impl WorktreeResolver for GitWorktreeResolver {
	async fn resolve(&self, project: &str, branch: &str) -> Result<PathBuf> {
		let entries = self.list(project).await?;
		let found = entries
			.into_iter()
			.find(|entry| !entry.bare && entry.branch.as_deref() == Some(branch));

		match found {
			Some(entry) => {
				debug!(project, branch, path = %entry.path.display(), "resolved worktree");
				Ok(entry.path)
			}
			None => Err(WorktreeError::BranchNotFound {
				project: project.to_string(),
				branch: branch.to_string(),
			}),
		}
	}
}
