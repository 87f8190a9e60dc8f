// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Console sessions and their deterministic names.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Console id used when the caller does not name one.
pub const DEFAULT_CONSOLE_ID: &str = "main";

/// Upper bound on generated session names, prefix included.
pub const MAX_SESSION_NAME_LEN: usize = 48;

/// Hex characters of the digest appended to every name.
const DIGEST_HEX_LEN: usize = 12;

/// One externally persisted terminal bound to `(project, branch, console_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSession {
	pub name: String,
	pub project: String,
	pub branch: String,
	pub console_id: String,
	pub cwd: PathBuf,
	pub created_at: DateTime<Utc>,
}

/// Derive the multiplexer session name for a console.
///
/// The readable part is a lowercase `[a-z0-9-_]` slug truncated to fit
/// [`MAX_SESSION_NAME_LEN`]; the trailing digest covers the untruncated
/// triple, so distinct triples whose slugs collide still get distinct names.
pub fn session_name(prefix: &str, project: &str, branch: &str, console_id: &str) -> String {
	let digest = Sha256::new()
		.chain_update(project.as_bytes())
		.chain_update([0u8])
		.chain_update(branch.as_bytes())
		.chain_update([0u8])
		.chain_update(console_id.as_bytes())
		.finalize();
	let hash = hex::encode(&digest[..DIGEST_HEX_LEN / 2]);

	let prefix = slugify(prefix);
	let budget = MAX_SESSION_NAME_LEN.saturating_sub(prefix.len() + 1 + DIGEST_HEX_LEN);

	let mut slug = slugify(&format!("{project}-{branch}-{console_id}"));
	slug.truncate(budget);
	let slug = slug.trim_matches('-');

	if slug.is_empty() {
		format!("{prefix}{hash}")
	} else {
		format!("{prefix}{slug}-{hash}")
	}
}

fn slugify(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for c in input.chars() {
		let mapped = if c.is_ascii_alphanumeric() {
			c.to_ascii_lowercase()
		} else if c == '_' {
			'_'
		} else {
			'-'
		};
		if mapped == '-' && out.ends_with('-') {
			continue;
		}
		out.push(mapped);
	}
	out
}
