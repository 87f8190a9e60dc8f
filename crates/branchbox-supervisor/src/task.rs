// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use branchbox_core::{LogEntry, OrchestratorError, Result, StreamKey};
use branchbox_stream::StreamHub;
use branchbox_worktree::WorktreeResolver;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::launch::{exit_code, next_line, LaunchEnv};

/// Runs one-shot commands in a worktree, streamed under the task key.
#[derive(Clone)]
pub struct TaskRunner {
	resolver: Arc<dyn WorktreeResolver>,
	hub: StreamHub,
	launch: LaunchEnv,
}

impl TaskRunner {
	pub fn new(resolver: Arc<dyn WorktreeResolver>, hub: StreamHub, launch: LaunchEnv) -> Self {
		Self { resolver, hub, launch }
	}

	/// Spawn `command` and return its pid; the final record carries the exit code.
	pub async fn run(&self, project: &str, branch: &str, command: &str) -> Result<u32> {
		if command.trim().is_empty() {
			return Err(OrchestratorError::Invalid("command must not be empty".to_string()));
		}
		let cwd = self.resolver.resolve(project, branch).await?;
		let key = StreamKey::task(project, branch);

		let child = self.launch.shell_command(command, &cwd, None).spawn().map_err(|e| {
			warn!(project, branch, command, error = %e, "failed to spawn task");
			self.hub
				.publish(&key, LogEntry::error(format!("failed to spawn `{command}`: {e}")));
			OrchestratorError::SpawnFailure(format!("{command}: {e}"))
		})?;

		let pid = child.id().unwrap_or_default();
		info!(project, branch, pid, command, "task started");
		self.hub.publish(&key, LogEntry::system(format!("$ {command}")));
		tokio::spawn(pump(self.hub.clone(), key, child));
		Ok(pid)
	}
}

async fn pump(hub: StreamHub, key: StreamKey, mut child: Child) {
	let mut stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
	let mut stderr = child.stderr.take().map(|s| BufReader::new(s).lines());

	loop {
		tokio::select! {
			Some(line) = next_line(&mut stdout), if stdout.is_some() => hub.publish(&key, LogEntry::stdout(line)),
			Some(line) = next_line(&mut stderr), if stderr.is_some() => hub.publish(&key, LogEntry::stderr(line)),
			else => break,
		}
	}

	let code = match child.wait().await {
		Ok(status) => exit_code(status),
		Err(e) => {
			warn!(key = %key, error = %e, "failed to wait for task");
			None
		}
	};
	debug!(key = %key, exit_code = ?code, "task finished");
	let message = match code {
		Some(code) => format!("exited with code {code}"),
		None => "exited".to_string(),
	};
	hub.publish(&key, LogEntry::system(message).with_exit_code(code));
}
