// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for registry persistence.

use std::path::PathBuf;

use branchbox_core::OrchestratorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("failed to access registry file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse registry file {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("failed to serialize registry: {0}")]
	Serialize(#[from] serde_json::Error),
}

impl From<RegistryError> for OrchestratorError {
	fn from(err: RegistryError) -> Self {
		OrchestratorError::Persistence(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, RegistryError>;
