// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Console session routes.

use std::convert::Infallible;

use axum::{
	extract::{Path, Query, State},
	response::sse::{Event, Sse},
	Json,
};
use branchbox_console::KillOutcome;
use branchbox_core::ConsoleSession;
use serde::{Deserialize, Serialize};
use tokio_stream::Stream;

use crate::api_response::{require, ApiError};
use crate::sse::event_stream;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RunConsoleRequest {
	pub branch: String,
	pub command: String,
	#[serde(default)]
	pub console_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunConsoleResponse {
	pub session_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConsoleParams {
	pub console_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KillConsoleResponse {
	pub session_name: String,
	pub outcome: KillOutcome,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionParams {
	/// Defaults to the configured session prefix.
	pub prefix: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
	pub sessions: Vec<String>,
}

/// POST /api/projects/{project}/consoles - Ensure the session and inject a command.
#[tracing::instrument(skip(state, body), fields(branch = %body.branch, console_id = ?body.console_id))]
pub async fn run_console(
	State(state): State<AppState>,
	Path(project): Path<String>,
	Json(body): Json<RunConsoleRequest>,
) -> Result<Json<RunConsoleResponse>, ApiError> {
	require("branch", &body.branch)?;
	let session = state
		.consoles
		.run(
			&project,
			&body.branch,
			&body.command,
			body.console_id.as_deref(),
		)
		.await?;
	Ok(Json(RunConsoleResponse {
		session_name: session.name,
	}))
}

/// GET /api/projects/{project}/consoles - Reconciled console list.
#[tracing::instrument(skip(state))]
pub async fn list_consoles(
	State(state): State<AppState>,
	Path(project): Path<String>,
) -> Result<Json<Vec<ConsoleSession>>, ApiError> {
	Ok(Json(state.consoles.list_project(&project).await?))
}

/// DELETE /api/projects/{project}/consoles/{branch}?console_id=
///
/// Killing a session that is already gone succeeds with outcome `not_found`.
#[tracing::instrument(skip(state))]
pub async fn kill_console(
	State(state): State<AppState>,
	Path((project, branch)): Path<(String, String)>,
	Query(params): Query<ConsoleParams>,
) -> Result<Json<KillConsoleResponse>, ApiError> {
	let console_id = params.console_id.as_deref();
	let session_name = state.consoles.session_name(&project, &branch, console_id);
	let outcome = state.consoles.kill(&project, &branch, console_id).await?;
	Ok(Json(KillConsoleResponse {
		session_name,
		outcome,
	}))
}

/// GET /api/projects/{project}/consoles/{branch}/stream?console_id= - SSE of screen updates.
pub async fn stream_console(
	State(state): State<AppState>,
	Path((project, branch)): Path<(String, String)>,
	Query(params): Query<ConsoleParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	event_stream(
		state
			.consoles
			.subscribe(&project, &branch, params.console_id.as_deref()),
	)
}

/// GET /api/sessions - Live multiplexer sessions under the naming prefix.
#[tracing::instrument(skip(state))]
pub async fn list_sessions(
	State(state): State<AppState>,
	Query(params): Query<SessionParams>,
) -> Result<Json<SessionListResponse>, ApiError> {
	let prefix = params
		.prefix
		.unwrap_or_else(|| state.consoles.prefix().to_string());
	Ok(Json(SessionListResponse {
		sessions: state.consoles.list(&prefix).await?,
	}))
}
