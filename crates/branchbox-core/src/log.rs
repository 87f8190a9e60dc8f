// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Observable output units delivered to live viewers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
	Stdout,
	Stderr,
	/// Lifecycle notices emitted by the orchestrator itself
	System,
	Error,
}

/// One line of output held in a stream key's ring buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
	pub timestamp: DateTime<Utc>,
	#[serde(rename = "type")]
	pub kind: LogKind,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exit_code: Option<i32>,
}

impl LogEntry {
	pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
		Self {
			timestamp: Utc::now(),
			kind,
			message: message.into(),
			exit_code: None,
		}
	}

	pub fn stdout(message: impl Into<String>) -> Self {
		Self::new(LogKind::Stdout, message)
	}

	pub fn stderr(message: impl Into<String>) -> Self {
		Self::new(LogKind::Stderr, message)
	}

	pub fn system(message: impl Into<String>) -> Self {
		Self::new(LogKind::System, message)
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self::new(LogKind::Error, message)
	}

	#[must_use]
	pub fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
		self.exit_code = exit_code;
		self
	}
}

/// Marker serialized as `"type": "refresh"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTag {
	Refresh,
}

/// Full replacement of a viewer's content.
///
/// Sent when a polled capture changed in a way that is not a pure append,
/// and as the replay record for polled keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshEvent {
	#[serde(rename = "type")]
	pub tag: RefreshTag,
	pub full_content: String,
	pub timestamp: DateTime<Utc>,
}

impl RefreshEvent {
	pub fn new(full_content: impl Into<String>) -> Self {
		Self {
			tag: RefreshTag::Refresh,
			full_content: full_content.into(),
			timestamp: Utc::now(),
		}
	}
}

/// A record delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
	Log(LogEntry),
	Refresh(RefreshEvent),
}

impl StreamEvent {
	/// SSE event name for this record.
	pub fn event_name(&self) -> &'static str {
		match self {
			StreamEvent::Log(_) => "log",
			StreamEvent::Refresh(_) => "refresh",
		}
	}

	pub fn as_log(&self) -> Option<&LogEntry> {
		match self {
			StreamEvent::Log(entry) => Some(entry),
			StreamEvent::Refresh(_) => None,
		}
	}

	pub fn as_refresh(&self) -> Option<&RefreshEvent> {
		match self {
			StreamEvent::Refresh(refresh) => Some(refresh),
			StreamEvent::Log(_) => None,
		}
	}
}

impl From<LogEntry> for StreamEvent {
	fn from(entry: LogEntry) -> Self {
		StreamEvent::Log(entry)
	}
}

impl From<RefreshEvent> for StreamEvent {
	fn from(refresh: RefreshEvent) -> Self {
		StreamEvent::Refresh(refresh)
	}
}
