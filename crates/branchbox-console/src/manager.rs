// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::ffi::OsString;
use std::sync::Arc;

use branchbox_core::{
	session_name, ConsoleSession, OrchestratorError, Result, StreamKey, DEFAULT_CONSOLE_ID,
};
use branchbox_registry::{find_console, remove_console, upsert_console, ConsoleMap, ConsoleRegistry};
use branchbox_stream::{StreamHub, Subscription};
use branchbox_worktree::WorktreeResolver;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::multiplexer::{KillOutcome, Multiplexer};

#[derive(Debug, Clone)]
pub struct ConsoleOptions {
	/// Prepended to every session name; also the filter for [`ConsoleManager::list`].
	pub session_prefix: String,
	/// Exported as `PATH` once, when a session is created.
	pub path: Option<OsString>,
}

impl Default for ConsoleOptions {
	fn default() -> Self {
		Self {
			session_prefix: "bbx-".to_string(),
			path: None,
		}
	}
}

pub struct ConsoleManager {
	mux: Arc<dyn Multiplexer>,
	resolver: Arc<dyn WorktreeResolver>,
	registry: ConsoleRegistry,
	hub: StreamHub,
	options: ConsoleOptions,
	gate: Mutex<()>,
}

impl ConsoleManager {
	pub fn new(
		mux: Arc<dyn Multiplexer>,
		resolver: Arc<dyn WorktreeResolver>,
		registry: ConsoleRegistry,
		hub: StreamHub,
		options: ConsoleOptions,
	) -> Self {
		Self {
			mux,
			resolver,
			registry,
			hub,
			options,
			gate: Mutex::new(()),
		}
	}

	pub fn prefix(&self) -> &str {
		&self.options.session_prefix
	}

	pub fn session_name(&self, project: &str, branch: &str, console_id: Option<&str>) -> String {
		session_name(
			&self.options.session_prefix,
			project,
			branch,
			console_id.unwrap_or(DEFAULT_CONSOLE_ID),
		)
	}

	/// Return the console's session, creating it in the worktree if absent.
	pub async fn ensure(&self, project: &str, branch: &str, console_id: Option<&str>) -> Result<ConsoleSession> {
		let console_id = console_id.unwrap_or(DEFAULT_CONSOLE_ID);
		if console_id.trim().is_empty() {
			return Err(OrchestratorError::Invalid("console id must not be empty".to_string()));
		}
		let name = session_name(&self.options.session_prefix, project, branch, console_id);
		let cwd = self.resolver.resolve(project, branch).await?;

		let _gate = self.gate.lock().await;
		let mut map = self.registry.load().await;

		let created = !self.mux.has_session(&name).await?;
		if created {
			self.mux.new_session(&name, &cwd).await?;
			if let Some(path) = &self.options.path {
				let export = format!("export PATH={}", shell_single_quote(&path.to_string_lossy()));
				self.mux.send_keys(&name, &export).await?;
			}
			info!(project, branch, console_id, session = %name, cwd = %cwd.display(), "console session created");
		}

		let existing = if created {
			None
		} else {
			find_console(&map, project, &name).cloned()
		};
		let session = match existing {
			Some(existing) => existing,
			None => {
				let session = ConsoleSession {
					name: name.clone(),
					project: project.to_string(),
					branch: branch.to_string(),
					console_id: console_id.to_string(),
					cwd,
					created_at: Utc::now(),
				};
				upsert_console(&mut map, session.clone());
				self.persist(&map).await;
				session
			}
		};

		self.hub
			.attach_session(&StreamKey::console(project, branch, console_id), &name);
		Ok(session)
	}

	/// Type `text` into the session and press Enter.
	///
	/// Output is not awaited; it arrives through polling.
	pub async fn inject(&self, name: &str, text: &str) -> Result<()> {
		self.mux.send_keys(name, text).await?;
		debug!(session = name, "command injected");
		Ok(())
	}

	/// Ensure the console, inject `command`, and start polling its key.
	pub async fn run(
		&self,
		project: &str,
		branch: &str,
		command: &str,
		console_id: Option<&str>,
	) -> Result<ConsoleSession> {
		if command.trim().is_empty() {
			return Err(OrchestratorError::Invalid("command must not be empty".to_string()));
		}
		let session = self.ensure(project, branch, console_id).await?;
		self.inject(&session.name, command).await?;
		self.hub
			.start_polling(&StreamKey::console(project, branch, &session.console_id));
		Ok(session)
	}

	/// Subscribe to a console's output, attaching its session for polling.
	pub fn subscribe(&self, project: &str, branch: &str, console_id: Option<&str>) -> Subscription {
		let console_id = console_id.unwrap_or(DEFAULT_CONSOLE_ID);
		let key = StreamKey::console(project, branch, console_id);
		self.hub.attach_session(
			&key,
			session_name(&self.options.session_prefix, project, branch, console_id),
		);
		self.hub.subscribe(&key)
	}

	pub async fn kill_session(&self, name: &str) -> Result<KillOutcome> {
		let outcome = self.mux.kill_session(name).await?;
		match outcome {
			KillOutcome::Killed => info!(session = name, "console session killed"),
			KillOutcome::NotFound => debug!(session = name, "console session already gone"),
		}
		Ok(outcome)
	}

	/// Kill the console's session and forget its metadata. Idempotent.
	pub async fn kill(&self, project: &str, branch: &str, console_id: Option<&str>) -> Result<KillOutcome> {
		let console_id = console_id.unwrap_or(DEFAULT_CONSOLE_ID);
		let name = session_name(&self.options.session_prefix, project, branch, console_id);
		let outcome = self.kill_session(&name).await?;
		self.hub
			.detach_session(&StreamKey::console(project, branch, console_id));

		let _gate = self.gate.lock().await;
		let mut map = self.registry.load().await;
		if remove_console(&mut map, project, &name) {
			self.persist(&map).await;
		}
		Ok(outcome)
	}

	/// Live session names starting with `prefix`.
	pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
		let mut names: Vec<String> = self
			.mux
			.list_sessions()
			.await?
			.into_iter()
			.filter(|name| name.starts_with(prefix))
			.collect();
		names.sort();
		Ok(names)
	}

	/// The project's console records, dropping those whose session is gone.
	pub async fn list_project(&self, project: &str) -> Result<Vec<ConsoleSession>> {
		let live: HashSet<String> = self.mux.list_sessions().await?.into_iter().collect();

		let _gate = self.gate.lock().await;
		let mut map = self.registry.load().await;
		let Some(entries) = map.get_mut(project) else {
			return Ok(Vec::new());
		};

		let before = entries.len();
		entries.retain(|console| live.contains(&console.name));
		let stale = before - entries.len();
		let consoles = entries.clone();
		if entries.is_empty() {
			map.remove(project);
		}
		if stale > 0 {
			info!(project, stale, "dropped consoles whose session is gone");
			self.persist(&map).await;
		}
		Ok(consoles)
	}

	async fn persist(&self, map: &ConsoleMap) {
		if let Err(e) = self.registry.save(map).await {
			error!(path = %self.registry.path().display(), error = %e, "failed to persist console registry");
		}
	}
}

fn shell_single_quote(value: &str) -> String {
	format!("'{}'", value.replace('\'', "'\"'\"'"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::InMemoryMultiplexer;
	use crate::multiplexer::MultiplexerCapture;
	use branchbox_core::StreamEvent;
	use branchbox_stream::HubConfig;
	use branchbox_worktree::FixedWorktreeResolver;
	use std::path::PathBuf;
	use std::time::Duration;
	use tempfile::TempDir;
	use tokio::time::timeout;

	struct Fixture {
		manager: ConsoleManager,
		mux: InMemoryMultiplexer,
		registry: ConsoleRegistry,
		worktree: PathBuf,
		_tmp: TempDir,
	}

	fn fixture(path: Option<&str>) -> Fixture {
		let tmp = TempDir::new().unwrap();
		let worktree = tmp.path().join("feature-x");
		let resolver = FixedWorktreeResolver::new().with("acme", "feature-x", &worktree);
		let mux = InMemoryMultiplexer::new();
		let hub = StreamHub::with_capture_source(
			HubConfig {
				buffer_capacity: 100,
				poll_interval: Duration::from_millis(20),
			},
			Arc::new(MultiplexerCapture::new(Arc::new(mux.clone()))),
		);
		let registry = ConsoleRegistry::in_dir(tmp.path());
		let manager = ConsoleManager::new(
			Arc::new(mux.clone()),
			Arc::new(resolver),
			registry.clone(),
			hub,
			ConsoleOptions {
				session_prefix: "bbx-".to_string(),
				path: path.map(OsString::from),
			},
		);
		Fixture {
			manager,
			mux,
			registry,
			worktree,
			_tmp: tmp,
		}
	}

	async fn next(sub: &mut Subscription) -> StreamEvent {
		timeout(Duration::from_secs(5), sub.recv())
			.await
			.expect("timed out")
			.expect("stream closed")
	}

	#[tokio::test]
	async fn test_ensure_creates_once_with_path_export() {
		let f = fixture(Some("/opt/tools:/usr/bin"));
		let first = f.manager.ensure("acme", "feature-x", None).await.unwrap();
		let again = f.manager.ensure("acme", "feature-x", None).await.unwrap();

		assert_eq!(first, again);
		assert_eq!(first.console_id, DEFAULT_CONSOLE_ID);
		assert!(first.name.starts_with("bbx-"));
		assert_eq!(f.mux.cwd(&first.name), Some(f.worktree.clone()));
		assert_eq!(f.mux.sent(&first.name), vec!["export PATH='/opt/tools:/usr/bin'".to_string()]);
	}

	#[tokio::test]
	async fn test_distinct_console_ids_get_distinct_sessions() {
		let f = fixture(None);
		let main = f.manager.ensure("acme", "feature-x", None).await.unwrap();
		let logs = f.manager.ensure("acme", "feature-x", Some("logs")).await.unwrap();
		assert_ne!(main.name, logs.name);
		assert_eq!(f.manager.list("bbx-").await.unwrap().len(), 2);
	}

	#[tokio::test]
	async fn test_run_streams_through_polling() {
		let f = fixture(None);
		let session = f
			.manager
			.run("acme", "feature-x", "npm test", None)
			.await
			.unwrap();
		assert_eq!(f.mux.sent(&session.name), vec!["npm test".to_string()]);

		let mut sub = f.manager.subscribe("acme", "feature-x", None);
		let first = next(&mut sub).await;
		assert_eq!(first.as_refresh().unwrap().full_content, "$ npm test");

		f.mux.print(&session.name, "PASS app.test.ts");
		let appended = next(&mut sub).await;
		assert_eq!(appended.as_log().unwrap().message, "PASS app.test.ts");

		f.mux.redraw(&session.name, "fresh");
		let refresh = next(&mut sub).await;
		assert_eq!(refresh.as_refresh().unwrap().full_content, "fresh");
	}

	#[tokio::test]
	async fn test_kill_is_idempotent() {
		let f = fixture(None);
		let session = f.manager.ensure("acme", "feature-x", Some("build")).await.unwrap();

		assert_eq!(
			f.manager.kill("acme", "feature-x", Some("build")).await.unwrap(),
			KillOutcome::Killed
		);
		assert_eq!(
			f.manager.kill("acme", "feature-x", Some("build")).await.unwrap(),
			KillOutcome::NotFound
		);
		assert_eq!(
			f.manager.kill("acme", "feature-x", Some("never-made")).await.unwrap(),
			KillOutcome::NotFound
		);
		assert!(find_console(&f.registry.load().await, "acme", &session.name).is_none());
	}

	#[tokio::test]
	async fn test_list_filters_by_prefix() {
		let f = fixture(None);
		f.manager.ensure("acme", "feature-x", None).await.unwrap();
		f.mux
			.new_session("someone-elses", std::path::Path::new("/tmp"))
			.await
			.unwrap();

		let names = f.manager.list(f.manager.prefix()).await.unwrap();
		assert_eq!(names.len(), 1);
		assert!(names[0].starts_with("bbx-"));
	}

	#[tokio::test]
	async fn test_list_project_drops_vanished_sessions() {
		let f = fixture(None);
		let main = f.manager.ensure("acme", "feature-x", None).await.unwrap();
		let logs = f.manager.ensure("acme", "feature-x", Some("logs")).await.unwrap();
		f.mux.vanish(&logs.name);

		let consoles = f.manager.list_project("acme").await.unwrap();
		assert_eq!(consoles, vec![main.clone()]);

		let persisted = f.registry.load().await;
		assert!(find_console(&persisted, "acme", &logs.name).is_none());
		assert!(find_console(&persisted, "acme", &main.name).is_some());
	}

	#[tokio::test]
	async fn test_recreated_session_gets_fresh_record() {
		let f = fixture(None);
		let first = f.manager.ensure("acme", "feature-x", None).await.unwrap();
		f.mux.vanish(&first.name);
		let second = f.manager.ensure("acme", "feature-x", None).await.unwrap();
		assert_eq!(first.name, second.name);
		assert!(second.created_at >= first.created_at);
		assert!(f.mux.has_session(&second.name).await.unwrap());
	}

	#[tokio::test]
	async fn test_missing_worktree_and_empty_command() {
		let f = fixture(None);
		assert!(matches!(
			f.manager.ensure("acme", "nope", None).await,
			Err(OrchestratorError::NotFound(_))
		));
		assert!(matches!(
			f.manager.run("acme", "feature-x", "   ", None).await,
			Err(OrchestratorError::Invalid(_))
		));
	}

	#[test]
	fn test_shell_single_quote() {
		assert_eq!(shell_single_quote("/a b"), "'/a b'");
		assert_eq!(shell_single_quote("it's"), "'it'\"'\"'s'");
	}
}
