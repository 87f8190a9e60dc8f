// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! branchbox server binary.

use std::path::PathBuf;
use std::sync::Arc;

use branchbox_console::TmuxMultiplexer;
use branchbox_server::{create_app_state, create_router, version};
use branchbox_worktree::GitWorktreeResolver;
use clap::{Parser, Subcommand};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// branchbox - per-branch dev servers and console sessions.
#[derive(Parser, Debug)]
#[command(name = "branchbox-server", about = "Per-branch process orchestration server", version)]
struct Args {
	/// Path to a TOML config file (defaults to the user config directory)
	#[arg(long, env = "BRANCHBOX_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => branchbox_config::load_config_with_file(path)?,
		None => branchbox_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		data_dir = %config.paths.data_dir.display(),
		projects = config.projects.len(),
		"starting branchbox-server"
	);

	let mux = Arc::new(TmuxMultiplexer::new(
		config.console.tmux_binary.clone(),
		config.console.history_lines,
	));
	let resolver = Arc::new(GitWorktreeResolver::new(config.projects.clone()));
	let state = create_app_state(&config, mux, resolver);

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	// Dev servers outlive the orchestrator; the next start reconciles them.
	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
