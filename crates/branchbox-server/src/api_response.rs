// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error responses shared by every handler.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use branchbox_core::OrchestratorError;
use serde::{Deserialize, Serialize};

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			error: error.into(),
			message: message.into(),
		}
	}
}

/// Handler error; converts an [`OrchestratorError`] into a status and body.
#[derive(Debug)]
pub struct ApiError(pub OrchestratorError);

impl From<OrchestratorError> for ApiError {
	fn from(err: OrchestratorError) -> Self {
		Self(err)
	}
}

pub fn status_for(err: &OrchestratorError) -> StatusCode {
	match err {
		OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
		OrchestratorError::Conflict(_) => StatusCode::CONFLICT,
		OrchestratorError::SpawnFailure(_) | OrchestratorError::Persistence(_) => {
			StatusCode::INTERNAL_SERVER_ERROR
		}
		OrchestratorError::ExternalService(_) => StatusCode::BAD_GATEWAY,
		OrchestratorError::Invalid(_) => StatusCode::BAD_REQUEST,
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = status_for(&self.0);
		if status.is_server_error() {
			tracing::warn!(error = %self.0, "request failed");
		}
		(status, Json(ErrorResponse::new(self.0.code(), self.0.to_string()))).into_response()
	}
}

/// Create a 400 Bad Request error.
pub fn bad_request(message: impl Into<String>) -> ApiError {
	ApiError(OrchestratorError::Invalid(message.into()))
}

/// Reject blank path or body fields before any work is done.
pub fn require(field: &str, value: &str) -> Result<(), ApiError> {
	if value.trim().is_empty() {
		return Err(bad_request(format!("{field} must not be empty")));
	}
	Ok(())
}
