// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background watcher for one spawned server.

use std::sync::Arc;
use std::time::Duration;

use branchbox_core::{LogEntry, ServerProcess, ServerStatus, StreamKey};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tracing::{info, warn};

use crate::launch::{exit_code, next_line};
use crate::readiness::ReadinessClassifier;
use crate::supervisor::SharedState;

/// Output still buffered in the pipes after exit is read for at most this long.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

struct Watched {
	state: Arc<SharedState>,
	key: StreamKey,
	pid: u32,
	port: u16,
}

/// Stream output, classify readiness, and record the exit.
pub(crate) async fn watch(state: Arc<SharedState>, record: ServerProcess, mut child: Child, grace: Duration) {
	let watched = Watched {
		state,
		key: StreamKey::server(&record.project, &record.branch),
		pid: record.pid,
		port: record.port,
	};
	let mut stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
	let mut stderr = child.stderr.take().map(|s| BufReader::new(s).lines());
	let mut readiness = ReadinessClassifier::new();
	let grace_timer = tokio::time::sleep(grace);
	tokio::pin!(grace_timer);

	let status = loop {
		tokio::select! {
			biased;
			Some(line) = next_line(&mut stdout) => {
				let fired = readiness.on_stdout(&line);
				watched.publish(LogEntry::stdout(line));
				if let Some(status) = fired {
					watched.settle(status).await;
				}
			}
			Some(line) = next_line(&mut stderr) => {
				let fired = readiness.on_stderr(&line);
				watched.publish(LogEntry::stderr(line));
				if let Some(status) = fired {
					watched.settle(status).await;
				}
			}
			() = &mut grace_timer, if readiness.is_pending() => {
				if let Some(status) = readiness.on_grace_elapsed() {
					watched.settle(status).await;
				}
			}
			status = child.wait() => break status,
		}
	};

	let _ = tokio::time::timeout(DRAIN_TIMEOUT, async {
		loop {
			tokio::select! {
				Some(line) = next_line(&mut stdout), if stdout.is_some() => watched.publish(LogEntry::stdout(line)),
				Some(line) = next_line(&mut stderr), if stderr.is_some() => watched.publish(LogEntry::stderr(line)),
				else => break,
			}
		}
	})
	.await;

	let code = match status {
		Ok(status) => exit_code(status),
		Err(e) => {
			warn!(key = %watched.key, pid = watched.pid, error = %e, "failed to wait for server");
			None
		}
	};
	watched
		.state
		.transition(&watched.key.project, &watched.key.branch, watched.pid, |record| {
			record.mark_stopped(code);
			true
		})
		.await;

	info!(key = %watched.key, pid = watched.pid, exit_code = ?code, "server exited");
	let message = match code {
		Some(code) => format!("server exited with code {code}"),
		None => "server exited".to_string(),
	};
	watched.publish(LogEntry::system(message).with_exit_code(code));
}

impl Watched {
	fn publish(&self, entry: LogEntry) {
		self.state.hub.publish(&self.key, entry);
	}

	/// Leave `starting` unless something else already moved the record on.
	async fn settle(&self, status: ServerStatus) {
		let updated = self
			.state
			.transition(&self.key.project, &self.key.branch, self.pid, |record| {
				if record.status != ServerStatus::Starting {
					return false;
				}
				record.status = status;
				true
			})
			.await;
		if updated.is_none() {
			return;
		}

		match status {
			ServerStatus::Error => {
				warn!(key = %self.key, pid = self.pid, "server reported an error before becoming ready");
				self.publish(LogEntry::error("server reported an error before becoming ready"));
			}
			_ => {
				info!(key = %self.key, pid = self.pid, port = self.port, "server running");
				self.publish(LogEntry::system(format!("server running on port {}", self.port)));
			}
		}
	}
}
