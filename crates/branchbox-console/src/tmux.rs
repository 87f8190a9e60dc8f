// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::error::{MultiplexerError, Result};
use crate::multiplexer::{KillOutcome, Multiplexer};

/// stderr fragments meaning the session (or the whole server) is absent.
const MISSING_MARKERS: [&str; 5] = [
	"can't find session",
	"session not found",
	"no server running",
	"error connecting to",
	"no such file or directory",
];

pub fn is_missing_session(stderr: &str) -> bool {
	let stderr = stderr.to_lowercase();
	MISSING_MARKERS.iter().any(|marker| stderr.contains(marker))
}

pub fn is_duplicate_session(stderr: &str) -> bool {
	stderr.to_lowercase().contains("duplicate session")
}

/// One name per line, blanks dropped.
pub fn parse_session_list(stdout: &str) -> Vec<String> {
	stdout
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(str::to_string)
		.collect()
}

/// Exact-match session target, so `bbx-a` never resolves to `bbx-ab`.
fn session_target(name: &str) -> String {
	format!("={name}")
}

/// Active pane of the exactly-named session.
fn pane_target(name: &str) -> String {
	format!("={name}:")
}

struct TmuxOutput {
	success: bool,
	stdout: String,
	stderr: String,
}

/// [`Multiplexer`] over the tmux CLI.
#[derive(Debug, Clone)]
pub struct TmuxMultiplexer {
	binary: String,
	history_lines: u32,
}

impl TmuxMultiplexer {
	pub fn new(binary: impl Into<String>, history_lines: u32) -> Self {
		Self {
			binary: binary.into(),
			history_lines,
		}
	}

	async fn run(&self, args: &[&str]) -> Result<TmuxOutput> {
		trace!(cmd = %format!("{} {}", self.binary, args.join(" ")), "running tmux command");

		let output = Command::new(&self.binary).args(args).output().await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				warn!(binary = %self.binary, "tmux not found in PATH");
				MultiplexerError::NotInstalled {
					binary: self.binary.clone(),
				}
			} else {
				MultiplexerError::Io(e)
			}
		})?;

		Ok(TmuxOutput {
			success: output.status.success(),
			stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
			stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
		})
	}

	async fn run_checked(&self, args: &[&str]) -> Result<String> {
		let output = self.run(args).await?;
		if output.success {
			return Ok(output.stdout);
		}
		Err(self.failure(args, output.stderr))
	}

	fn failure(&self, args: &[&str], stderr: String) -> MultiplexerError {
		MultiplexerError::CommandFailed {
			binary: self.binary.clone(),
			args: args.iter().map(|s| s.to_string()).collect(),
			stderr,
		}
	}

	/// Commands aimed at one session, mapping "no such session" distinctly.
	async fn run_on_session(&self, name: &str, args: &[&str]) -> Result<String> {
		let output = self.run(args).await?;
		if output.success {
			return Ok(output.stdout);
		}
		if is_missing_session(&output.stderr) {
			return Err(MultiplexerError::SessionNotFound(name.to_string()));
		}
		Err(self.failure(args, output.stderr))
	}
}

#[async_trait]
impl Multiplexer for TmuxMultiplexer {
	async fn has_session(&self, name: &str) -> Result<bool> {
		let target = session_target(name);
		let args = ["has-session", "-t", target.as_str()];
		let output = self.run(&args).await?;
		if output.success {
			return Ok(true);
		}
		if is_missing_session(&output.stderr) {
			return Ok(false);
		}
		Err(self.failure(&args, output.stderr))
	}

	async fn new_session(&self, name: &str, cwd: &Path) -> Result<()> {
		let cwd = cwd.to_string_lossy();
		let args = ["new-session", "-d", "-s", name, "-c", cwd.as_ref()];
		let output = self.run(&args).await?;
		if !output.success {
			if !is_duplicate_session(&output.stderr) {
				return Err(self.failure(&args, output.stderr));
			}
			debug!(session = name, "session already exists");
			return Ok(());
		}

		let history = self.history_lines.to_string();
		let target = session_target(name);
		if let Err(e) = self
			.run_checked(&["set-option", "-t", target.as_str(), "history-limit", history.as_str()])
			.await
		{
			warn!(session = name, error = %e, "failed to set history limit");
		}
		debug!(session = name, cwd = %cwd, "created session");
		Ok(())
	}

	async fn send_keys(&self, name: &str, text: &str) -> Result<()> {
		let target = pane_target(name);
		self.run_on_session(name, &["send-keys", "-t", target.as_str(), "-l", "--", text])
			.await?;
		self.run_on_session(name, &["send-keys", "-t", target.as_str(), "Enter"])
			.await?;
		Ok(())
	}

	async fn kill_session(&self, name: &str) -> Result<KillOutcome> {
		let target = session_target(name);
		match self
			.run_on_session(name, &["kill-session", "-t", target.as_str()])
			.await
		{
			Ok(_) => Ok(KillOutcome::Killed),
			Err(MultiplexerError::SessionNotFound(_)) => Ok(KillOutcome::NotFound),
			Err(e) => Err(e),
		}
	}

	async fn list_sessions(&self) -> Result<Vec<String>> {
		let args = ["list-sessions", "-F", "#{session_name}"];
		let output = self.run(&args).await?;
		if output.success {
			return Ok(parse_session_list(&output.stdout));
		}
		if is_missing_session(&output.stderr) {
			return Ok(Vec::new());
		}
		Err(self.failure(&args, output.stderr))
	}

	async fn capture(&self, name: &str) -> Result<String> {
		let start = format!("-{}", self.history_lines);
		let target = pane_target(name);
		self.run_on_session(
			name,
			&["capture-pane", "-p", "-J", "-t", target.as_str(), "-S", start.as_str()],
		)
		.await
	}
}
