// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::convert::Infallible;

use axum::{
	extract::{Path, State},
	response::sse::{Event, Sse},
	Json,
};
use branchbox_core::StreamKey;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;

use crate::api_response::{require, ApiError};
use crate::sse::event_stream;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RunTaskRequest {
	pub branch: String,
	pub command: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunTaskResponse {
	pub pid: u32,
}

/// POST /api/projects/{project}/tasks - Run a one-shot command in the worktree.
#[tracing::instrument(skip(state, body), fields(branch = %body.branch))]
pub async fn run_task(
	State(state): State<AppState>,
	Path(project): Path<String>,
	Json(body): Json<RunTaskRequest>,
) -> Result<Json<RunTaskResponse>, ApiError> {
	require("branch", &body.branch)?;
	let pid = state.tasks.run(&project, &body.branch, &body.command).await?;
	Ok(Json(RunTaskResponse { pid }))
}

/// GET /api/projects/{project}/tasks/{branch}/stream
pub async fn stream_task(
	State(state): State<AppState>,
	Path((project, branch)): Path<(String, String)>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	event_stream(state.hub.subscribe(&StreamKey::task(project, branch)))
}
