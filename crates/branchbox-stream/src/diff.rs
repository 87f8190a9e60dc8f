// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Line-level deltas between consecutive captures.

/// What a new capture means for a viewer that saw the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureDelta {
	Unchanged,
	/// New trailing lines after an otherwise identical capture
	Append(Vec<String>),
	/// Content changed in place; replace the viewer's content
	Refresh(String),
}

/// Strip the blank rows a terminal pads below the cursor.
pub fn normalize_capture(raw: &str) -> String {
	raw.trim_end().to_string()
}

/// Compare two normalized captures.
///
/// Only a capture that extends the previous one by whole new lines is an
/// append. A changed last line, scroll-buffer truncation, or a redraw is a
/// refresh.
pub fn diff_capture(previous: Option<&str>, next: &str) -> CaptureDelta {
	let Some(previous) = previous else {
		if next.is_empty() {
			return CaptureDelta::Unchanged;
		}
		return CaptureDelta::Refresh(next.to_string());
	};

	if previous == next {
		return CaptureDelta::Unchanged;
	}

	if previous.is_empty() {
		return CaptureDelta::Append(next.split('\n').map(str::to_string).collect());
	}

	if next.len() > previous.len()
		&& next.starts_with(previous)
		&& next.as_bytes()[previous.len()] == b'\n'
	{
		let tail = &next[previous.len() + 1..];
		return CaptureDelta::Append(tail.split('\n').map(str::to_string).collect());
	}

	CaptureDelta::Refresh(next.to_string())
}
