// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP and SSE surface for branchbox.
//!
//! [`AppState`] wires the supervisor, console manager, task runner and
//! stream hub together; [`create_router`] exposes them under `/api`.

pub mod api_response;
pub mod routes;
mod sse;
pub mod version;

use std::sync::Arc;

use axum::{
	routing::{get, post},
	Router,
};
use branchbox_config::Config;
use branchbox_console::{ConsoleManager, ConsoleOptions, Multiplexer, MultiplexerCapture};
use branchbox_registry::{ConsoleRegistry, ServerRegistry};
use branchbox_stream::{HubConfig, StreamHub};
use branchbox_supervisor::{Supervisor, SupervisorOptions, TaskRunner};
use branchbox_worktree::{AppDetector, ManifestDetector, WorktreeResolver};

#[derive(Clone)]
pub struct AppState {
	pub supervisor: Supervisor,
	pub consoles: Arc<ConsoleManager>,
	pub tasks: TaskRunner,
	pub hub: StreamHub,
	pub resolver: Arc<dyn WorktreeResolver>,
	pub detector: Arc<dyn AppDetector>,
}

/// Build the application state from resolved configuration.
///
/// The multiplexer and resolver are passed in so tests can substitute
/// in-memory implementations.
pub fn create_app_state(
	config: &Config,
	mux: Arc<dyn Multiplexer>,
	resolver: Arc<dyn WorktreeResolver>,
) -> AppState {
	let hub = StreamHub::with_capture_source(
		HubConfig {
			buffer_capacity: config.stream.buffer_capacity,
			poll_interval: config.stream.poll_interval,
		},
		Arc::new(MultiplexerCapture::new(Arc::clone(&mux))),
	);
	let detector: Arc<dyn AppDetector> = Arc::new(ManifestDetector::new());
	let data_dir = &config.paths.data_dir;

	let supervisor = Supervisor::new(
		ServerRegistry::in_dir(data_dir),
		hub.clone(),
		Arc::clone(&resolver),
		SupervisorOptions {
			base_port: config.supervisor.base_port,
			readiness_grace: config.supervisor.readiness_grace,
			default_command: config.supervisor.default_command.clone(),
			bind_host: config.supervisor.bind_host.clone(),
			extra_path: config.supervisor.extra_path.clone(),
		},
	)
	.with_detector(Arc::clone(&detector));

	let launch = supervisor.launch_env().clone();
	let consoles = ConsoleManager::new(
		mux,
		Arc::clone(&resolver),
		ConsoleRegistry::in_dir(data_dir),
		hub.clone(),
		ConsoleOptions {
			session_prefix: config.console.session_prefix.clone(),
			path: Some(launch.path().clone()),
		},
	);
	let tasks = TaskRunner::new(Arc::clone(&resolver), hub.clone(), launch);

	AppState {
		supervisor,
		consoles: Arc::new(consoles),
		tasks,
		hub,
		resolver,
		detector,
	}
}

pub fn create_router(state: AppState) -> Router {
	let project_routes = Router::new()
		.route(
			"/servers",
			get(routes::servers::list_servers).post(routes::servers::start_server),
		)
		.route(
			"/servers/{branch}",
			axum::routing::delete(routes::servers::stop_server),
		)
		.route(
			"/servers/{branch}/stream",
			get(routes::servers::stream_server),
		)
		.route(
			"/consoles",
			get(routes::consoles::list_consoles).post(routes::consoles::run_console),
		)
		.route(
			"/consoles/{branch}",
			axum::routing::delete(routes::consoles::kill_console),
		)
		.route(
			"/consoles/{branch}/stream",
			get(routes::consoles::stream_console),
		)
		.route("/tasks", post(routes::tasks::run_task))
		.route("/tasks/{branch}/stream", get(routes::tasks::stream_task))
		.route(
			"/worktrees/{branch}/apps",
			get(routes::apps::detect_apps),
		);

	Router::new()
		.route("/health", get(routes::health::health))
		.route("/api/sessions", get(routes::consoles::list_sessions))
		.nest("/api/projects/{project}", project_routes)
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use std::path::Path;
	use std::time::Duration;

	use axum::{
		body::Body,
		http::{Request, StatusCode},
	};
	use branchbox_console::InMemoryMultiplexer;
	use branchbox_worktree::FixedWorktreeResolver;
	use serde_json::{json, Value};
	use tempfile::TempDir;
	use tower::ServiceExt;

	use super::*;

	struct Harness {
		router: Router,
		mux: InMemoryMultiplexer,
		worktree: TempDir,
		_data: TempDir,
	}

	fn harness() -> Harness {
		let data = tempfile::tempdir().unwrap();
		let worktree = tempfile::tempdir().unwrap();

		let mut config = Config::default();
		config.paths.data_dir = data.path().to_path_buf();
		config.stream.poll_interval = Duration::from_millis(50);
		config.supervisor.base_port = 41_300;
		config.supervisor.readiness_grace = Duration::from_millis(200);

		let mux = InMemoryMultiplexer::new();
		let resolver = FixedWorktreeResolver::new().with("shop", "feature-x", worktree.path());
		let state = create_app_state(&config, Arc::new(mux.clone()), Arc::new(resolver));

		Harness {
			router: create_router(state),
			mux,
			worktree,
			_data: data,
		}
	}

	async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
		let builder = Request::builder().method(method).uri(uri);
		let request = match body {
			Some(body) => builder
				.header("content-type", "application/json")
				.body(Body::from(body.to_string()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};
		let response = router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let value = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, value)
	}

	fn write_package_json(dir: &Path) {
		std::fs::write(
			dir.join("package.json"),
			r#"{"name":"shop","scripts":{"dev":"vite"}}"#,
		)
		.unwrap();
	}

	#[tokio::test]
	async fn test_health() {
		let h = harness();
		let (status, body) = send(&h.router, "GET", "/health", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
	}

	#[tokio::test]
	async fn test_start_unknown_worktree_is_404() {
		let h = harness();
		let (status, body) = send(
			&h.router,
			"POST",
			"/api/projects/shop/servers",
			Some(json!({ "branch": "nope", "command": "true" })),
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "not_found");
		assert!(body["message"].as_str().unwrap().contains("nope"));
	}

	#[tokio::test]
	async fn test_start_blank_branch_is_400() {
		let h = harness();
		let (status, body) = send(
			&h.router,
			"POST",
			"/api/projects/shop/servers",
			Some(json!({ "branch": " " })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "invalid_params");
	}

	#[tokio::test]
	async fn test_stop_unknown_server_is_404() {
		let h = harness();
		let (status, _) = send(&h.router, "DELETE", "/api/projects/shop/servers/feature-x", None).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_server_lifecycle() {
		let h = harness();
		let start = json!({ "branch": "feature-x", "command": "sleep 30", "port": 41_377 });

		let (status, body) = send(&h.router, "POST", "/api/projects/shop/servers", Some(start.clone())).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["port"], 41_377);
		assert_eq!(body["status"], "starting");
		assert!(body["pid"].as_u64().unwrap() > 0);

		let (status, body) = send(&h.router, "POST", "/api/projects/shop/servers", Some(start)).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "conflict");

		let (status, body) = send(&h.router, "GET", "/api/projects/shop/servers", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body.as_array().unwrap().len(), 1);
		assert_eq!(body[0]["branch"], "feature-x");

		let (status, body) = send(&h.router, "DELETE", "/api/projects/shop/servers/feature-x", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "stopped");

		let (_, body) = send(&h.router, "GET", "/api/projects/shop/servers", None).await;
		assert_eq!(body[0]["status"], "stopped");
	}

	#[tokio::test]
	async fn test_console_run_list_and_kill() {
		let h = harness();
		let (status, body) = send(
			&h.router,
			"POST",
			"/api/projects/shop/consoles",
			Some(json!({ "branch": "feature-x", "command": "ls" })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		let name = body["session_name"].as_str().unwrap().to_string();
		assert!(name.starts_with("bbx-"));
		assert!(h.mux.sent(&name).iter().any(|text| text == "ls"));

		let (status, body) = send(&h.router, "GET", "/api/projects/shop/consoles", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body[0]["name"], name.as_str());

		let (status, body) = send(&h.router, "GET", "/api/sessions", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["sessions"], json!([name]));

		let (status, body) = send(&h.router, "DELETE", "/api/projects/shop/consoles/feature-x", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["outcome"], "killed");

		let (status, body) = send(&h.router, "DELETE", "/api/projects/shop/consoles/feature-x", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["outcome"], "not_found");

		let (_, body) = send(&h.router, "GET", "/api/projects/shop/consoles", None).await;
		assert_eq!(body, json!([]));
	}

	#[tokio::test]
	async fn test_console_ids_get_distinct_sessions() {
		let h = harness();
		let (_, main) = send(
			&h.router,
			"POST",
			"/api/projects/shop/consoles",
			Some(json!({ "branch": "feature-x", "command": "ls" })),
		)
		.await;
		let (_, logs) = send(
			&h.router,
			"POST",
			"/api/projects/shop/consoles",
			Some(json!({ "branch": "feature-x", "command": "tail -f log", "console_id": "logs" })),
		)
		.await;
		assert_ne!(main["session_name"], logs["session_name"]);

		let (_, body) = send(
			&h.router,
			"DELETE",
			"/api/projects/shop/consoles/feature-x?console_id=logs",
			None,
		)
		.await;
		assert_eq!(body["session_name"], logs["session_name"]);
		assert_eq!(body["outcome"], "killed");
	}

	#[tokio::test]
	async fn test_stream_is_event_stream() {
		let h = harness();
		let request = Request::get("/api/projects/shop/servers/feature-x/stream")
			.body(Body::empty())
			.unwrap();
		let response = h.router.clone().oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			response.headers()["content-type"].to_str().unwrap(),
			"text/event-stream"
		);
	}

	#[tokio::test]
	async fn test_detect_apps() {
		let h = harness();
		write_package_json(h.worktree.path());
		let (status, body) = send(&h.router, "GET", "/api/projects/shop/worktrees/feature-x/apps", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body[0]["command"], "npm run dev");
		assert_eq!(body[0]["port"], 5173);
	}

	#[tokio::test]
	async fn test_task_requires_command() {
		let h = harness();
		let (status, _) = send(
			&h.router,
			"POST",
			"/api/projects/shop/tasks",
			Some(json!({ "branch": "feature-x", "command": "" })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_task_runs() {
		let h = harness();
		let (status, body) = send(
			&h.router,
			"POST",
			"/api/projects/shop/tasks",
			Some(json!({ "branch": "feature-x", "command": "echo done" })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert!(body["pid"].as_u64().unwrap() > 0);
	}
}
