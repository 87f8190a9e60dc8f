// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "ok",
		version: crate::version::VERSION,
	})
}
