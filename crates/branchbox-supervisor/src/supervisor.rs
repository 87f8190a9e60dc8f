// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use branchbox_core::{LogEntry, OrchestratorError, Result, ServerProcess, ServerStatus, StreamKey};
use branchbox_registry::{active_ports, find_server_mut, next_free_port, upsert_server, ServerMap, ServerRegistry};
use branchbox_stream::StreamHub;
use branchbox_worktree::{AppDetector, WorktreeResolver};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::launch::LaunchEnv;
use crate::monitor;
use crate::process::{ProcessControl, SystemProcessControl, Termination};

#[derive(Debug, Clone)]
pub struct SupervisorOptions {
	/// Lowest port handed out when the caller does not request one.
	pub base_port: u16,
	/// How long a silent server stays `starting` before it is assumed up.
	pub readiness_grace: Duration,
	/// Run when neither the caller nor the detector supplies a command.
	pub default_command: String,
	/// Exported as `HOST`.
	pub bind_host: String,
	/// Prepended to `PATH` ahead of the common toolchain directories.
	pub extra_path: Vec<PathBuf>,
}

impl Default for SupervisorOptions {
	fn default() -> Self {
		Self {
			base_port: 3100,
			readiness_grace: Duration::from_secs(5),
			default_command: "npm run dev".to_string(),
			bind_host: "0.0.0.0".to_string(),
			extra_path: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct StartRequest {
	pub command: Option<String>,
	pub port: Option<u16>,
}

/// What will actually be spawned.
struct LaunchPlan {
	command: String,
	cwd: PathBuf,
	port: u16,
}

/// State shared with the per-server monitor tasks.
pub(crate) struct SharedState {
	pub(crate) registry: ServerRegistry,
	pub(crate) hub: StreamHub,
	/// Serializes registry read-modify-write cycles within this process.
	gate: Mutex<()>,
}

impl SharedState {
	/// Apply `update` to the branch's record if it still belongs to `pid`.
	///
	/// Returns the updated record when `update` reported a change.
	pub(crate) async fn transition(
		&self,
		project: &str,
		branch: &str,
		pid: u32,
		update: impl FnOnce(&mut ServerProcess) -> bool,
	) -> Option<ServerProcess> {
		let _gate = self.gate.lock().await;
		let mut map = self.registry.load().await;
		let record = find_server_mut(&mut map, project, branch)?;
		if record.pid != pid {
			debug!(project, branch, pid, current = record.pid, "record superseded, ignoring transition");
			return None;
		}
		if !update(record) {
			return None;
		}
		let updated = record.clone();
		self.persist(&map).await;
		Some(updated)
	}

	async fn persist(&self, map: &ServerMap) {
		if let Err(e) = self.registry.save(map).await {
			error!(path = %self.registry.path().display(), error = %e, "failed to persist server registry");
		}
	}
}

/// Owns the dev server lifecycle for every branch of every project.
#[derive(Clone)]
pub struct Supervisor {
	state: Arc<SharedState>,
	resolver: Arc<dyn WorktreeResolver>,
	detector: Option<Arc<dyn AppDetector>>,
	process: Arc<dyn ProcessControl>,
	options: Arc<SupervisorOptions>,
	launch: LaunchEnv,
}

impl Supervisor {
	pub fn new(
		registry: ServerRegistry,
		hub: StreamHub,
		resolver: Arc<dyn WorktreeResolver>,
		options: SupervisorOptions,
	) -> Self {
		let launch = LaunchEnv::new(options.bind_host.clone(), &options.extra_path);
		Self {
			state: Arc::new(SharedState {
				registry,
				hub,
				gate: Mutex::new(()),
			}),
			resolver,
			detector: None,
			process: Arc::new(SystemProcessControl),
			options: Arc::new(options),
			launch,
		}
	}

	#[must_use]
	pub fn with_detector(mut self, detector: Arc<dyn AppDetector>) -> Self {
		self.detector = Some(detector);
		self
	}

	#[must_use]
	pub fn with_process_control(mut self, process: Arc<dyn ProcessControl>) -> Self {
		self.process = process;
		self
	}

	pub fn launch_env(&self) -> &LaunchEnv {
		&self.launch
	}

	/// Spawn a dev server for the branch and record it as `starting`.
	///
	/// Returns as soon as the child is spawned; readiness and exit are
	/// recorded later by a background monitor.
	pub async fn start(&self, project: &str, branch: &str, request: StartRequest) -> Result<ServerProcess> {
		if request.command.as_deref().is_some_and(|c| c.trim().is_empty()) {
			return Err(OrchestratorError::Invalid("command must not be empty".to_string()));
		}

		let _gate = self.state.gate.lock().await;
		let mut map = self.state.registry.load().await;

		if let Some(existing) = find_server_mut(&mut map, project, branch) {
			if existing.is_active() {
				if self.process.is_alive(existing.pid) {
					return Err(OrchestratorError::Conflict(format!(
						"server for {project}/{branch} is already {} on port {}",
						existing.status, existing.port
					)));
				}
				info!(project, branch, pid = existing.pid, "stale server record, marking stopped");
				existing.mark_stopped(None);
			}
		}

		let worktree = self.resolver.resolve(project, branch).await?;
		let plan = self.plan(&worktree, request, &map).await?;
		let key = StreamKey::server(project, branch);

		let child = match self.launch.shell_command(&plan.command, &plan.cwd, Some(plan.port)).spawn() {
			Ok(child) => child,
			Err(e) => {
				warn!(project, branch, command = %plan.command, error = %e, "failed to spawn server");
				let mut failed = ServerProcess::starting(project, branch, plan.port, 0, &plan.command);
				failed.status = ServerStatus::Error;
				upsert_server(&mut map, failed);
				self.state.persist(&map).await;
				self.state
					.hub
					.publish(&key, LogEntry::error(format!("failed to spawn `{}`: {e}", plan.command)));
				return Err(OrchestratorError::SpawnFailure(format!("{}: {e}", plan.command)));
			}
		};

		let pid = child.id().unwrap_or_default();
		let record = ServerProcess::starting(project, branch, plan.port, pid, &plan.command);
		upsert_server(&mut map, record.clone());
		self.state.persist(&map).await;

		info!(project, branch, pid, port = plan.port, command = %plan.command, "server starting");
		self.state.hub.publish(
			&key,
			LogEntry::system(format!("starting `{}` on port {}", plan.command, plan.port)),
		);
		tokio::spawn(monitor::watch(
			self.state.clone(),
			record.clone(),
			child,
			self.options.readiness_grace,
		));

		Ok(record)
	}

	async fn plan(&self, worktree: &Path, request: StartRequest, map: &ServerMap) -> Result<LaunchPlan> {
		let detected = match (&request.command, &self.detector) {
			(None, Some(detector)) => detector.detect(worktree).await.into_iter().next(),
			_ => None,
		};

		let (command, cwd) = match (request.command, &detected) {
			(Some(command), _) => (command, worktree.to_path_buf()),
			(None, Some(app)) => {
				debug!(app = %app.name, command = %app.command, "using detected app");
				(app.command.clone(), app.cwd.clone())
			}
			(None, None) => (self.options.default_command.clone(), worktree.to_path_buf()),
		};

		let taken = active_ports(map);
		let hinted = detected
			.as_ref()
			.and_then(|app| app.port)
			.filter(|port| !taken.contains(port));
		let port = match request.port.or(hinted) {
			Some(port) => port,
			None => next_free_port(map, self.options.base_port).ok_or_else(|| {
				OrchestratorError::SpawnFailure(format!(
					"no free port at or above {}",
					self.options.base_port
				))
			})?,
		};

		Ok(LaunchPlan { command, cwd, port })
	}

	/// Terminate the branch's server process group and mark it stopped.
	///
	/// Signal failures are logged and treated as "already gone".
	pub async fn stop(&self, project: &str, branch: &str) -> Result<ServerProcess> {
		let _gate = self.state.gate.lock().await;
		let mut map = self.state.registry.load().await;
		let record = find_server_mut(&mut map, project, branch)
			.ok_or_else(|| OrchestratorError::NotFound(format!("no server for {project}/{branch}")))?;

		// An `error` record can still have a live process behind it.
		if record.status != ServerStatus::Stopped && record.pid > 0 {
			match self.process.terminate(record.pid) {
				Termination::Group => debug!(project, branch, pid = record.pid, "signalled process group"),
				Termination::Process => {
					warn!(project, branch, pid = record.pid, "process group signal failed, signalled pid only")
				}
				Termination::Failed(reason) => {
					warn!(project, branch, pid = record.pid, reason = %reason, "could not signal server, treating as gone")
				}
			}
		}
		record.mark_stopped(None);
		let stopped = record.clone();
		self.state.persist(&map).await;

		info!(project, branch, pid = stopped.pid, "server stopped");
		self.state
			.hub
			.publish(&StreamKey::server(project, branch), LogEntry::system("server stopped"));
		Ok(stopped)
	}

	/// The project's server records, with dead pids corrected to `stopped`.
	pub async fn list(&self, project: &str) -> Vec<ServerProcess> {
		let _gate = self.state.gate.lock().await;
		let mut map = self.state.registry.load().await;

		let mut changed = false;
		if let Some(entries) = map.get_mut(project) {
			for record in entries.iter_mut().filter(|r| r.is_active()) {
				if !self.process.is_alive(record.pid) {
					info!(project, branch = %record.branch, pid = record.pid, "server no longer alive, marking stopped");
					record.mark_stopped(None);
					changed = true;
				}
			}
		}
		if changed {
			self.state.persist(&map).await;
		}

		map.remove(project).unwrap_or_default()
	}
}
