// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dev server lifecycle routes.

use std::convert::Infallible;

use axum::{
	extract::{Path, State},
	response::sse::{Event, Sse},
	Json,
};
use branchbox_core::{ServerProcess, ServerStatus, StreamKey};
use branchbox_supervisor::StartRequest;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;

use crate::api_response::{require, ApiError};
use crate::sse::event_stream;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartServerRequest {
	pub branch: String,
	#[serde(default)]
	pub command: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartServerResponse {
	pub port: u16,
	pub pid: u32,
	pub status: ServerStatus,
}

/// GET /api/projects/{project}/servers - Reconciled server list.
#[tracing::instrument(skip(state))]
pub async fn list_servers(
	State(state): State<AppState>,
	Path(project): Path<String>,
) -> Json<Vec<ServerProcess>> {
	Json(state.supervisor.list(&project).await)
}

/// POST /api/projects/{project}/servers
#[tracing::instrument(skip(state, body), fields(branch = %body.branch))]
pub async fn start_server(
	State(state): State<AppState>,
	Path(project): Path<String>,
	Json(body): Json<StartServerRequest>,
) -> Result<Json<StartServerResponse>, ApiError> {
	require("branch", &body.branch)?;
	let server = state
		.supervisor
		.start(
			&project,
			&body.branch,
			StartRequest {
				command: body.command,
				port: body.port,
			},
		)
		.await?;
	Ok(Json(StartServerResponse {
		port: server.port,
		pid: server.pid,
		status: server.status,
	}))
}

/// DELETE /api/projects/{project}/servers/{branch}
#[tracing::instrument(skip(state))]
pub async fn stop_server(
	State(state): State<AppState>,
	Path((project, branch)): Path<(String, String)>,
) -> Result<Json<ServerProcess>, ApiError> {
	Ok(Json(state.supervisor.stop(&project, &branch).await?))
}

/// GET /api/projects/{project}/servers/{branch}/stream - SSE of server output.
pub async fn stream_server(
	State(state): State<AppState>,
	Path((project, branch)): Path<(String, String)>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	event_stream(state.hub.subscribe(&StreamKey::server(project, branch)))
}
