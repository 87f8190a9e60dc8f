// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("capture of session '{session}' failed: {message}")]
pub struct CaptureError {
	pub session: String,
	pub message: String,
}

/// An opaque output source that can only be snapshotted, not observed.
#[async_trait]
pub trait CaptureSource: Send + Sync {
	/// Return the session's full visible and scrollback text.
	async fn capture(&self, session: &str) -> Result<String, CaptureError>;
}
