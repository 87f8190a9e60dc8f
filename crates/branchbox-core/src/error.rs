// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for orchestration operations.

use thiserror::Error;

/// Errors returned synchronously by supervisor and console operations.
///
/// Failures that happen after a successful start (crashes, stderr-detected
/// errors) are state transitions, not errors, and never appear here.
#[derive(Debug, Error)]
pub enum OrchestratorError {
	/// No worktree, server or session exists for the given key.
	#[error("not found: {0}")]
	NotFound(String),

	/// A server is already starting or running for the branch.
	#[error("conflict: {0}")]
	Conflict(String),

	/// The operating system refused to create the process.
	#[error("spawn failure: {0}")]
	SpawnFailure(String),

	/// The terminal multiplexer command failed.
	#[error("external service failure: {0}")]
	ExternalService(String),

	/// The registry file could not be read or written.
	#[error("persistence failure: {0}")]
	Persistence(String),

	/// A caller-supplied value was rejected before any work was done.
	#[error("invalid input: {0}")]
	Invalid(String),
}

impl OrchestratorError {
	/// Stable machine-readable code for API responses.
	pub fn code(&self) -> &'static str {
		match self {
			OrchestratorError::NotFound(_) => "not_found",
			OrchestratorError::Conflict(_) => "conflict",
			OrchestratorError::SpawnFailure(_) => "spawn_failure",
			OrchestratorError::ExternalService(_) => "external_service_failure",
			OrchestratorError::Persistence(_) => "persistence_failure",
			OrchestratorError::Invalid(_) => "invalid_params",
		}
	}
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
