// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Advisory detection of runnable apps inside a worktree.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

/// Script names tried in order.
const DEV_SCRIPTS: [&str; 2] = ["dev", "start"];

/// Monorepo directories whose children are inspected.
const MONOREPO_DIRS: [&str; 2] = ["apps", "packages"];

/// Framework markers and the port their dev server listens on by default.
const PORT_HINTS: [(&str, u16); 3] = [("vite", 5173), ("next", 3000), ("astro", 4321)];

/// Something runnable found in a worktree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCandidate {
	pub name: String,
	pub command: String,
	pub cwd: PathBuf,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub port: Option<u16>,
}

#[async_trait]
pub trait AppDetector: Send + Sync {
	/// Candidates in preference order. Never fails; unreadable manifests are skipped.
	async fn detect(&self, worktree: &Path) -> Vec<AppCandidate>;
}

/// Reads `package.json` and `Cargo.toml` manifests.
#[derive(Debug, Clone, Default)]
pub struct ManifestDetector;

impl ManifestDetector {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl AppDetector for ManifestDetector {
	async fn detect(&self, worktree: &Path) -> Vec<AppCandidate> {
		let runner = package_runner(worktree).await;
		let mut candidates = Vec::new();

		let root_name = worktree
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| "root".to_string());
		candidates.extend(detect_node(worktree, &root_name, runner).await);
		if candidates.is_empty() {
			candidates.extend(detect_cargo(worktree, &root_name).await);
		}

		for dir in MONOREPO_DIRS {
			for child in child_dirs(&worktree.join(dir)).await {
				let name = child
					.file_name()
					.map(|n| n.to_string_lossy().into_owned())
					.unwrap_or_default();
				candidates.extend(detect_node(&child, &name, runner).await);
			}
		}

		debug!(worktree = %worktree.display(), count = candidates.len(), "detected apps");
		candidates
	}
}

async fn detect_node(dir: &Path, fallback_name: &str, runner: &str) -> Option<AppCandidate> {
	let manifest = read_json(&dir.join("package.json")).await?;
	let scripts = manifest.get("scripts")?.as_object()?;
	let (script, body) = DEV_SCRIPTS
		.iter()
		.find_map(|name| scripts.get(*name).and_then(Value::as_str).map(|body| (*name, body)))?;

	let name = manifest
		.get("name")
		.and_then(Value::as_str)
		.unwrap_or(fallback_name)
		.to_string();

	Some(AppCandidate {
		name,
		command: format!("{runner} run {script}"),
		cwd: dir.to_path_buf(),
		port: explicit_port(body).or_else(|| framework_port(body, &manifest)),
	})
}

async fn detect_cargo(dir: &Path, fallback_name: &str) -> Option<AppCandidate> {
	let text = tokio::fs::read_to_string(dir.join("Cargo.toml")).await.ok()?;
	let manifest: toml::Value = toml::from_str(&text).ok()?;
	let package = manifest.get("package")?;
	let name = package
		.get("name")
		.and_then(toml::Value::as_str)
		.unwrap_or(fallback_name)
		.to_string();

	Some(AppCandidate {
		name,
		command: "cargo run".to_string(),
		cwd: dir.to_path_buf(),
		port: None,
	})
}

/// Package manager implied by the lockfile at the worktree root.
async fn package_runner(root: &Path) -> &'static str {
	for (lockfile, runner) in [
		("pnpm-lock.yaml", "pnpm"),
		("yarn.lock", "yarn"),
		("bun.lockb", "bun"),
		("bun.lock", "bun"),
	] {
		if tokio::fs::try_exists(root.join(lockfile)).await.unwrap_or(false) {
			return runner;
		}
	}
	"npm"
}

/// Port given as `--port N` or `-p N` in a script body.
fn explicit_port(script: &str) -> Option<u16> {
	let mut words = script.split_whitespace();
	while let Some(word) = words.next() {
		if let Some(value) = word.strip_prefix("--port=") {
			return value.parse().ok();
		}
		if word == "--port" || word == "-p" {
			return words.next().and_then(|v| v.parse().ok());
		}
	}
	None
}

fn framework_port(script: &str, manifest: &Value) -> Option<u16> {
	let first_word = script.split_whitespace().next().unwrap_or_default();
	if let Some((_, port)) = PORT_HINTS.iter().find(|(marker, _)| first_word == *marker) {
		return Some(*port);
	}

	let has_dependency = |marker: &str| {
		["dependencies", "devDependencies"]
			.iter()
			.any(|table| manifest.get(*table).and_then(|deps| deps.get(marker)).is_some())
	};
	PORT_HINTS
		.iter()
		.find(|(marker, _)| has_dependency(marker))
		.map(|(_, port)| *port)
}

async fn read_json(path: &Path) -> Option<Value> {
	let text = tokio::fs::read_to_string(path).await.ok()?;
	match serde_json::from_str(&text) {
		Ok(value) => Some(value),
		Err(e) => {
			trace!(path = %path.display(), error = %e, "skipping unparsable manifest");
			None
		}
	}
}

async fn child_dirs(dir: &Path) -> Vec<PathBuf> {
	let Ok(mut read_dir) = tokio::fs::read_dir(dir).await else {
		return Vec::new();
	};
	let mut dirs = Vec::new();
	while let Ok(Some(entry)) = read_dir.next_entry().await {
		if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
			dirs.push(entry.path());
		}
	}
	dirs.sort();
	dirs
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	fn write(path: &Path, text: &str) {
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(path, text).unwrap();
	}

	#[tokio::test]
	async fn test_vite_app_gets_port_hint() {
		let tmp = TempDir::new().unwrap();
		write(
			&tmp.path().join("package.json"),
			r#"{"name":"web","scripts":{"dev":"vite","build":"vite build"}}"#,
		);

		let apps = ManifestDetector::new().detect(tmp.path()).await;
		assert_eq!(
			apps,
			vec![AppCandidate {
				name: "web".into(),
				command: "npm run dev".into(),
				cwd: tmp.path().to_path_buf(),
				port: Some(5173),
			}]
		);
	}

	#[tokio::test]
	async fn test_start_script_and_dependency_hint() {
		let tmp = TempDir::new().unwrap();
		write(
			&tmp.path().join("package.json"),
			r#"{"scripts":{"start":"node server.js"},"dependencies":{"next":"14.0.0"}}"#,
		);
		write(&tmp.path().join("pnpm-lock.yaml"), "");

		let apps = ManifestDetector::new().detect(tmp.path()).await;
		assert_eq!(apps[0].command, "pnpm run start");
		assert_eq!(apps[0].port, Some(3000));
	}

	#[tokio::test]
	async fn test_explicit_port_wins() {
		let tmp = TempDir::new().unwrap();
		write(
			&tmp.path().join("package.json"),
			r#"{"scripts":{"dev":"astro dev --port 4500"}}"#,
		);
		let apps = ManifestDetector::new().detect(tmp.path()).await;
		assert_eq!(apps[0].port, Some(4500));
	}

	#[tokio::test]
	async fn test_monorepo_children() {
		let tmp = TempDir::new().unwrap();
		write(&tmp.path().join("package.json"), r#"{"private":true}"#);
		write(&tmp.path().join("yarn.lock"), "");
		write(
			&tmp.path().join("apps/site/package.json"),
			r#"{"name":"site","scripts":{"dev":"astro dev"}}"#,
		);
		write(
			&tmp.path().join("packages/ui/package.json"),
			r#"{"name":"ui","scripts":{"build":"tsc"}}"#,
		);

		let apps = ManifestDetector::new().detect(tmp.path()).await;
		assert_eq!(apps.len(), 1);
		assert_eq!(apps[0].name, "site");
		assert_eq!(apps[0].command, "yarn run dev");
		assert_eq!(apps[0].cwd, tmp.path().join("apps/site"));
		assert_eq!(apps[0].port, Some(4321));
	}

	#[tokio::test]
	async fn test_cargo_project() {
		let tmp = TempDir::new().unwrap();
		write(
			&tmp.path().join("Cargo.toml"),
			"[package]\nname = \"api\"\nversion = \"0.1.0\"\n",
		);
		let apps = ManifestDetector::new().detect(tmp.path()).await;
		assert_eq!(apps[0].name, "api");
		assert_eq!(apps[0].command, "cargo run");
		assert_eq!(apps[0].port, None);
	}

	#[tokio::test]
	async fn test_nothing_detected() {
		let tmp = TempDir::new().unwrap();
		write(&tmp.path().join("package.json"), "not json");
		assert!(ManifestDetector::new().detect(tmp.path()).await.is_empty());
	}

	#[test]
	fn test_explicit_port_forms() {
		assert_eq!(explicit_port("next dev -p 3005"), Some(3005));
		assert_eq!(explicit_port("vite --port=6000"), Some(6000));
		assert_eq!(explicit_port("vite"), None);
	}
}
