// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Path, State},
	Json,
};
use branchbox_core::OrchestratorError;
use branchbox_worktree::AppCandidate;

use crate::api_response::ApiError;
use crate::AppState;

/// GET /api/projects/{project}/worktrees/{branch}/apps - Runnable app candidates.
#[tracing::instrument(skip(state))]
pub async fn detect_apps(
	State(state): State<AppState>,
	Path((project, branch)): Path<(String, String)>,
) -> Result<Json<Vec<AppCandidate>>, ApiError> {
	let path = state
		.resolver
		.resolve(&project, &branch)
		.await
		.map_err(OrchestratorError::from)?;
	Ok(Json(state.detector.detect(&path).await))
}
