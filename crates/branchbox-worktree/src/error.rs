// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io;

use branchbox_core::OrchestratorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorktreeError {
	#[error("unknown project: {0}")]
	UnknownProject(String),

	#[error("no worktree for branch '{branch}' in project '{project}'")]
	BranchNotFound { project: String, branch: String },

	#[error("git command failed: {cmd} {args:?}: {stderr}")]
	CommandFailed {
		cmd: &'static str,
		args: Vec<String>,
		stderr: String,
	},

	#[error("git is not installed or not in PATH")]
	GitNotInstalled,

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, WorktreeError>;

impl From<WorktreeError> for OrchestratorError {
	fn from(err: WorktreeError) -> Self {
		match err {
			WorktreeError::UnknownProject(_) | WorktreeError::BranchNotFound { .. } => {
				OrchestratorError::NotFound(err.to_string())
			}
			WorktreeError::CommandFailed { .. } | WorktreeError::GitNotInstalled | WorktreeError::Io(_) => {
				OrchestratorError::ExternalService(err.to_string())
			}
		}
	}
}
