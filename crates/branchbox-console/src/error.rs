// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io;

use branchbox_core::OrchestratorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MultiplexerError {
	#[error("{binary} is not installed or not in PATH")]
	NotInstalled { binary: String },

	#[error("{binary} {args:?} failed: {stderr}")]
	CommandFailed {
		binary: String,
		args: Vec<String>,
		stderr: String,
	},

	#[error("session not found: {0}")]
	SessionNotFound(String),

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MultiplexerError>;

impl From<MultiplexerError> for OrchestratorError {
	fn from(err: MultiplexerError) -> Self {
		match err {
			MultiplexerError::SessionNotFound(name) => {
				OrchestratorError::NotFound(format!("console session {name}"))
			}
			other => OrchestratorError::ExternalService(other.to_string()),
		}
	}
}
