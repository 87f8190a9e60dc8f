// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Building the child process: shell, working directory, environment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufRead, Lines};
use tokio::process::Command;

/// Directories where dev toolchains commonly live but which a service
/// manager's PATH often lacks.
pub fn common_toolchain_dirs() -> Vec<PathBuf> {
	let mut dirs = vec![
		PathBuf::from("/opt/homebrew/bin"),
		PathBuf::from("/usr/local/bin"),
	];
	if let Some(home) = dirs::home_dir() {
		for sub in [".cargo/bin", ".bun/bin", ".deno/bin", ".local/bin", ".volta/bin"] {
			dirs.push(home.join(sub));
		}
	}
	dirs
}

/// Prepend `extra` to `current`, skipping directories already present.
pub fn augment_path(extra: &[PathBuf], current: Option<OsString>) -> OsString {
	let existing: Vec<PathBuf> = current
		.as_ref()
		.map(|path| std::env::split_paths(path).collect())
		.unwrap_or_default();

	let mut merged: Vec<PathBuf> = Vec::with_capacity(extra.len() + existing.len());
	for dir in extra.iter().chain(existing.iter()) {
		if !merged.contains(dir) {
			merged.push(dir.clone());
		}
	}
	std::env::join_paths(merged).unwrap_or_else(|_| current.unwrap_or_default())
}

/// Environment shared by every spawned server and task.
#[derive(Debug, Clone)]
pub struct LaunchEnv {
	bind_host: String,
	path: OsString,
}

impl LaunchEnv {
	/// Uses the orchestrator's own PATH with `extra_path` and the common
	/// toolchain directories in front of it.
	pub fn new(bind_host: impl Into<String>, extra_path: &[PathBuf]) -> Self {
		let mut extra = extra_path.to_vec();
		extra.extend(common_toolchain_dirs());
		Self {
			bind_host: bind_host.into(),
			path: augment_path(&extra, std::env::var_os("PATH")),
		}
	}

	pub fn path(&self) -> &OsString {
		&self.path
	}

	/// `sh -c <command>` in its own process group with piped output.
	///
	/// The child is not killed when the handle drops: servers outlive the
	/// orchestrator and are found again by reconciliation.
	pub fn shell_command(&self, command: &str, cwd: &Path, port: Option<u16>) -> Command {
		let mut cmd = Command::new("sh");
		cmd.arg("-c")
			.arg(command)
			.current_dir(cwd)
			.env("PATH", &self.path)
			.env("HOST", &self.bind_host)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(false);
		if let Some(port) = port {
			cmd.env("PORT", port.to_string());
		}
		#[cfg(unix)]
		cmd.process_group(0);
		cmd
	}
}

/// Next line from an optional reader; pends forever once the reader is gone
/// so it can sit in a `select!` next to live branches.
pub(crate) async fn next_line<R>(lines: &mut Option<Lines<R>>) -> Option<String>
where
	R: AsyncBufRead + Unpin,
{
	let Some(reader) = lines.as_mut() else {
		return std::future::pending().await;
	};
	match reader.next_line().await {
		Ok(Some(line)) => Some(line),
		Ok(None) | Err(_) => {
			*lines = None;
			None
		}
	}
}

/// Exit code, or `128 + signal` for a signalled child.
pub fn exit_code(status: ExitStatus) -> Option<i32> {
	status.code().or_else(|| signal_code(status))
}

#[cfg(unix)]
fn signal_code(status: ExitStatus) -> Option<i32> {
	use std::os::unix::process::ExitStatusExt;
	status.signal().map(|signal| 128 + signal)
}

#[cfg(not(unix))]
fn signal_code(_status: ExitStatus) -> Option<i32> {
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_augment_path_prepends_and_dedups() {
		let merged = augment_path(
			&[PathBuf::from("/opt/tools"), PathBuf::from("/usr/bin")],
			Some(OsString::from("/usr/bin:/bin")),
		);
		let dirs: Vec<PathBuf> = std::env::split_paths(&merged).collect();
		assert_eq!(
			dirs,
			vec![
				PathBuf::from("/opt/tools"),
				PathBuf::from("/usr/bin"),
				PathBuf::from("/bin")
			]
		);
	}

	#[test]
	fn test_augment_without_current_path() {
		let merged = augment_path(&[PathBuf::from("/opt/tools")], None);
		assert_eq!(merged, OsString::from("/opt/tools"));
	}

	#[tokio::test]
	async fn test_shell_command_sets_port_and_host() {
		let env = LaunchEnv::new("0.0.0.0", &[]);
		let tmp = tempfile::TempDir::new().unwrap();
		let output = env
			.shell_command("echo \"$HOST:$PORT\"; pwd", tmp.path(), Some(4100))
			.output()
			.await
			.unwrap();
		let stdout = String::from_utf8_lossy(&output.stdout);
		let mut lines = stdout.lines();
		assert_eq!(lines.next(), Some("0.0.0.0:4100"));
		let cwd = PathBuf::from(lines.next().unwrap());
		assert_eq!(cwd.canonicalize().unwrap(), tmp.path().canonicalize().unwrap());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_signalled_exit_code() {
		let status = tokio::process::Command::new("sh")
			.args(["-c", "kill -TERM $$"])
			.status()
			.await
			.unwrap();
		assert_eq!(exit_code(status), Some(143));
	}
}
