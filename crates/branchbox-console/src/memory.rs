// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{MultiplexerError, Result};
use crate::multiplexer::{KillOutcome, Multiplexer};

#[derive(Debug, Clone, Default)]
struct MemorySession {
	cwd: PathBuf,
	sent: Vec<String>,
	screen: Vec<String>,
}

/// In-process multiplexer for tests and environments without tmux.
///
/// Typed text is echoed onto the session's screen, one line per command.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMultiplexer {
	sessions: Arc<Mutex<BTreeMap<String, MemorySession>>>,
}

impl InMemoryMultiplexer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Everything typed into `name` so far.
	pub fn sent(&self, name: &str) -> Vec<String> {
		self.sessions
			.lock()
			.get(name)
			.map(|s| s.sent.clone())
			.unwrap_or_default()
	}

	pub fn cwd(&self, name: &str) -> Option<PathBuf> {
		self.sessions.lock().get(name).map(|s| s.cwd.clone())
	}

	/// Simulate program output appearing in the pane.
	pub fn print(&self, name: &str, line: &str) {
		if let Some(session) = self.sessions.lock().get_mut(name) {
			session.screen.push(line.to_string());
		}
	}

	/// Simulate the pane being cleared and redrawn with `text`.
	pub fn redraw(&self, name: &str, text: &str) {
		if let Some(session) = self.sessions.lock().get_mut(name) {
			session.screen = text.lines().map(str::to_string).collect();
		}
	}

	/// Simulate a session killed outside the orchestrator.
	pub fn vanish(&self, name: &str) {
		self.sessions.lock().remove(name);
	}
}

#[async_trait]
impl Multiplexer for InMemoryMultiplexer {
	async fn has_session(&self, name: &str) -> Result<bool> {
		Ok(self.sessions.lock().contains_key(name))
	}

	async fn new_session(&self, name: &str, cwd: &Path) -> Result<()> {
		self.sessions
			.lock()
			.entry(name.to_string())
			.or_insert_with(|| MemorySession {
				cwd: cwd.to_path_buf(),
				..Default::default()
			});
		Ok(())
	}

	async fn send_keys(&self, name: &str, text: &str) -> Result<()> {
		let mut sessions = self.sessions.lock();
		let session = sessions
			.get_mut(name)
			.ok_or_else(|| MultiplexerError::SessionNotFound(name.to_string()))?;
		session.sent.push(text.to_string());
		session.screen.push(format!("$ {text}"));
		Ok(())
	}

	async fn kill_session(&self, name: &str) -> Result<KillOutcome> {
		Ok(match self.sessions.lock().remove(name) {
			Some(_) => KillOutcome::Killed,
			None => KillOutcome::NotFound,
		})
	}

	async fn list_sessions(&self) -> Result<Vec<String>> {
		Ok(self.sessions.lock().keys().cloned().collect())
	}

	async fn capture(&self, name: &str) -> Result<String> {
		self.sessions
			.lock()
			.get(name)
			.map(|s| s.screen.join("\n"))
			.ok_or_else(|| MultiplexerError::SessionNotFound(name.to_string()))
	}
}
