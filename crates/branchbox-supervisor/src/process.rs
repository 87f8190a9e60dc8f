// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OS-level liveness probing and termination of spawned process groups.

/// How a termination request was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
	/// The whole process group was signalled.
	Group,
	/// Group signalling failed; the pid alone was signalled.
	Process,
	/// Neither signal could be delivered, usually because the process is gone.
	Failed(String),
}

pub trait ProcessControl: Send + Sync {
	/// Zero-effect liveness probe.
	fn is_alive(&self, pid: u32) -> bool;

	/// Ask the process and its descendants to terminate.
	fn terminate(&self, pid: u32) -> Termination;
}

/// Signals real processes.
///
/// Children are spawned as their own process group leader, so the group id
/// equals the recorded pid.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessControl;

#[cfg(unix)]
impl ProcessControl for SystemProcessControl {
	fn is_alive(&self, pid: u32) -> bool {
		let Some(pid) = to_pid(pid) else {
			return false;
		};
		// SAFETY: signal 0 only checks existence and permissions.
		if unsafe { libc::kill(pid, 0) } == 0 {
			return !is_zombie(pid);
		}
		std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
	}

	fn terminate(&self, pid: u32) -> Termination {
		let Some(pid) = to_pid(pid) else {
			return Termination::Failed(format!("invalid pid {pid}"));
		};
		// SAFETY: plain signal delivery, no memory is shared.
		if unsafe { libc::killpg(pid, libc::SIGTERM) } == 0 {
			return Termination::Group;
		}
		let group_err = std::io::Error::last_os_error();
		// SAFETY: as above.
		if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
			return Termination::Process;
		}
		let pid_err = std::io::Error::last_os_error();
		Termination::Failed(format!("killpg: {group_err}; kill: {pid_err}"))
	}
}

#[cfg(not(unix))]
impl ProcessControl for SystemProcessControl {
	fn is_alive(&self, _pid: u32) -> bool {
		false
	}

	fn terminate(&self, pid: u32) -> Termination {
		Termination::Failed(format!("cannot signal pid {pid} on this platform"))
	}
}

/// Pid 0 and overflowing values would address process groups, not a process.
#[cfg(unix)]
fn to_pid(pid: u32) -> Option<libc::pid_t> {
	libc::pid_t::try_from(pid).ok().filter(|pid| *pid > 0)
}

/// An exited but unreaped child still answers signal 0.
#[cfg(target_os = "linux")]
fn is_zombie(pid: libc::pid_t) -> bool {
	let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
		return false;
	};
	stat.rsplit_once(')')
		.and_then(|(_, rest)| rest.trim_start().chars().next())
		== Some('Z')
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: libc::pid_t) -> bool {
	false
}

#[cfg(all(test, unix))]
mod tests {
	use super::*;
	use std::os::unix::process::CommandExt;
	use std::process::Command;
	use std::time::{Duration, Instant};

	#[test]
	fn test_own_process_is_alive() {
		assert!(SystemProcessControl.is_alive(std::process::id()));
	}

	#[test]
	fn test_pid_zero_is_never_alive() {
		assert!(!SystemProcessControl.is_alive(0));
		assert!(matches!(SystemProcessControl.terminate(0), Termination::Failed(_)));
	}

	fn wait_for_pid_file(path: &std::path::Path) -> u32 {
		let deadline = Instant::now() + Duration::from_secs(10);
		loop {
			if let Some(pid) = std::fs::read_to_string(path)
				.ok()
				.and_then(|text| text.trim().parse().ok())
			{
				return pid;
			}
			assert!(Instant::now() < deadline, "pid file never written");
			std::thread::sleep(Duration::from_millis(20));
		}
	}

	fn wait_until_dead(pid: u32) {
		let deadline = Instant::now() + Duration::from_secs(10);
		while SystemProcessControl.is_alive(pid) {
			assert!(Instant::now() < deadline, "pid {pid} still alive");
			std::thread::sleep(Duration::from_millis(20));
		}
	}

	#[test]
	fn test_terminate_kills_group() {
		let dir = tempfile::tempdir().unwrap();
		let pid_file = dir.path().join("grandchild.pid");
		let mut child = Command::new("sh")
			.arg("-c")
			.arg(format!("sleep 30 & echo $! > '{}'; wait", pid_file.display()))
			.process_group(0)
			.spawn()
			.unwrap();
		let pid = child.id();
		let grandchild = wait_for_pid_file(&pid_file);
		assert!(SystemProcessControl.is_alive(pid));
		assert!(SystemProcessControl.is_alive(grandchild));

		assert_eq!(SystemProcessControl.terminate(pid), Termination::Group);
		child.wait().unwrap();
		assert!(!SystemProcessControl.is_alive(pid));
		wait_until_dead(grandchild);
	}

	#[test]
	fn test_reaped_child_is_dead() {
		let mut child = Command::new("true").spawn().unwrap();
		let pid = child.id();
		child.wait().unwrap();
		assert!(!SystemProcessControl.is_alive(pid));
	}
}
