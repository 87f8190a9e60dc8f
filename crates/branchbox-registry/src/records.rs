// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Record maps keyed by project, with one entry per branch (or console).

use std::collections::BTreeMap;

use branchbox_core::{ConsoleSession, ServerProcess};

/// Server records keyed by project id.
pub type ServerMap = BTreeMap<String, Vec<ServerProcess>>;

/// Console records keyed by project id.
pub type ConsoleMap = BTreeMap<String, Vec<ConsoleSession>>;

pub fn find_server<'a>(map: &'a ServerMap, project: &str, branch: &str) -> Option<&'a ServerProcess> {
	map.get(project)?.iter().find(|s| s.branch == branch)
}

pub fn find_server_mut<'a>(
	map: &'a mut ServerMap,
	project: &str,
	branch: &str,
) -> Option<&'a mut ServerProcess> {
	map.get_mut(project)?.iter_mut().find(|s| s.branch == branch)
}

/// Insert a record, superseding any previous record for the same branch.
pub fn upsert_server(map: &mut ServerMap, server: ServerProcess) {
	let entries = map.entry(server.project.clone()).or_default();
	match entries.iter_mut().find(|s| s.branch == server.branch) {
		Some(existing) => *existing = server,
		None => entries.push(server),
	}
}

pub fn find_console<'a>(map: &'a ConsoleMap, project: &str, name: &str) -> Option<&'a ConsoleSession> {
	map.get(project)?.iter().find(|c| c.name == name)
}

pub fn upsert_console(map: &mut ConsoleMap, console: ConsoleSession) {
	let entries = map.entry(console.project.clone()).or_default();
	match entries.iter_mut().find(|c| c.name == console.name) {
		Some(existing) => *existing = console,
		None => entries.push(console),
	}
}

/// Remove a console record, returning whether one existed.
pub fn remove_console(map: &mut ConsoleMap, project: &str, name: &str) -> bool {
	let Some(entries) = map.get_mut(project) else {
		return false;
	};
	let before = entries.len();
	entries.retain(|c| c.name != name);
	let removed = entries.len() != before;
	if entries.is_empty() {
		map.remove(project);
	}
	removed
}

#[cfg(test)]
mod tests {
	use super::*;
	use branchbox_core::ServerStatus;
	use chrono::Utc;
	use std::path::PathBuf;

	fn console(project: &str, name: &str) -> ConsoleSession {
		ConsoleSession {
			name: name.to_string(),
			project: project.to_string(),
			branch: "main".to_string(),
			console_id: "main".to_string(),
			cwd: PathBuf::from("/tmp"),
			created_at: Utc::now(),
		}
	}

	#[test]
	fn test_upsert_supersedes_same_branch() {
		let mut map = ServerMap::new();
		let mut first = ServerProcess::starting("acme", "main", 3100, 1, "a");
		first.status = ServerStatus::Stopped;
		upsert_server(&mut map, first);
		upsert_server(&mut map, ServerProcess::starting("acme", "main", 3101, 2, "b"));
		upsert_server(&mut map, ServerProcess::starting("acme", "dev", 3102, 3, "c"));

		assert_eq!(map["acme"].len(), 2);
		let main = find_server(&map, "acme", "main").unwrap();
		assert_eq!(main.pid, 2);
		assert_eq!(main.status, ServerStatus::Starting);
	}

	#[test]
	fn test_find_server_scoped_by_project() {
		let mut map = ServerMap::new();
		upsert_server(&mut map, ServerProcess::starting("acme", "main", 3100, 1, "a"));
		assert!(find_server(&map, "other", "main").is_none());
	}

	#[test]
	fn test_remove_console() {
		let mut map = ConsoleMap::new();
		upsert_console(&mut map, console("acme", "bbx-a"));
		upsert_console(&mut map, console("acme", "bbx-b"));

		assert!(remove_console(&mut map, "acme", "bbx-a"));
		assert!(!remove_console(&mut map, "acme", "bbx-a"));
		assert!(find_console(&map, "acme", "bbx-b").is_some());

		assert!(remove_console(&mut map, "acme", "bbx-b"));
		assert!(map.is_empty());
	}
}
