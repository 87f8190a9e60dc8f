// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Development server records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// One development server bound to a branch.
///
/// At most one record per `(project, branch)` may be active. Records are
/// superseded by a later start for the same branch, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProcess {
	pub project: String,
	pub branch: String,
	pub port: u16,
	pub pid: u32,
	pub status: ServerStatus,
	pub started_at: DateTime<Utc>,
	pub command: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exit_code: Option<i32>,
}

impl ServerProcess {
	#[must_use]
	pub fn starting(
		project: impl Into<String>,
		branch: impl Into<String>,
		port: u16,
		pid: u32,
		command: impl Into<String>,
	) -> Self {
		Self {
			project: project.into(),
			branch: branch.into(),
			port,
			pid,
			status: ServerStatus::Starting,
			started_at: Utc::now(),
			command: command.into(),
			exit_code: None,
		}
	}

	/// Whether this record still claims its port and branch.
	#[must_use]
	pub fn is_active(&self) -> bool {
		self.status.is_active()
	}

	/// Mark the record stopped, keeping an exit code if one is known.
	pub fn mark_stopped(&mut self, exit_code: Option<i32>) {
		self.status = ServerStatus::Stopped;
		if exit_code.is_some() {
			self.exit_code = exit_code;
		}
	}
}

/// Server lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
	/// Spawned, no readiness signal yet
	Starting,
	/// Readiness signal seen or grace window elapsed
	Running,
	/// Exited or stopped explicitly
	Stopped,
	/// Spawn failed or stderr reported an error before readiness
	Error,
}

impl ServerStatus {
	#[must_use]
	pub fn is_active(self) -> bool {
		matches!(self, ServerStatus::Starting | ServerStatus::Running)
	}
}

impl std::fmt::Display for ServerStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ServerStatus::Starting => write!(f, "starting"),
			ServerStatus::Running => write!(f, "running"),
			ServerStatus::Stopped => write!(f, "stopped"),
			ServerStatus::Error => write!(f, "error"),
		}
	}
}

impl std::str::FromStr for ServerStatus {
	type Err = OrchestratorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"starting" => Ok(ServerStatus::Starting),
			"running" => Ok(ServerStatus::Running),
			"stopped" => Ok(ServerStatus::Stopped),
			"error" => Ok(ServerStatus::Error),
			_ => Err(OrchestratorError::Invalid(format!("unknown server status '{s}'"))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_active_statuses() {
		assert!(ServerStatus::Starting.is_active());
		assert!(ServerStatus::Running.is_active());
		assert!(!ServerStatus::Stopped.is_active());
		assert!(!ServerStatus::Error.is_active());
	}

	#[test]
	fn test_mark_stopped_keeps_previous_exit_code() {
		let mut server = ServerProcess::starting("acme", "main", 3100, 42, "npm run dev");
		server.mark_stopped(Some(1));
		server.mark_stopped(None);
		assert_eq!(server.status, ServerStatus::Stopped);
		assert_eq!(server.exit_code, Some(1));
	}

	#[test]
	fn test_wire_format_is_camel_case() {
		let server = ServerProcess::starting("acme", "feature-x", 5173, 7, "serve");
		let json = serde_json::to_value(&server).unwrap();
		assert_eq!(json["status"], "starting");
		assert!(json.get("startedAt").is_some());
		assert!(json.get("exitCode").is_none());
	}

	proptest! {
		#[test]
		fn status_roundtrip(status in prop_oneof![
			Just(ServerStatus::Starting),
			Just(ServerStatus::Running),
			Just(ServerStatus::Stopped),
			Just(ServerStatus::Error),
		]) {
			let parsed: ServerStatus = status.to_string().parse().unwrap();
			prop_assert_eq!(status, parsed);
		}
	}
}
