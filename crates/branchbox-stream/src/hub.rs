// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The stream hub: key registry and public fan-out API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use branchbox_core::{LogEntry, StreamKey};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::actor::{Command, KeyActor};
use crate::capture::CaptureSource;
use crate::subscription::Subscription;

/// Default ring buffer size per key.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1_000;

/// Default interval between captures of a polled session.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct HubConfig {
	pub buffer_capacity: usize,
	pub poll_interval: Duration,
}

impl Default for HubConfig {
	fn default() -> Self {
		Self {
			buffer_capacity: DEFAULT_BUFFER_CAPACITY,
			poll_interval: DEFAULT_POLL_INTERVAL,
		}
	}
}

/// Point-in-time view of one key's actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStats {
	pub subscribers: usize,
	pub buffered: usize,
	pub polling: bool,
	pub session: Option<String>,
}

/// Fan-out of output events to live subscribers, keyed by [`StreamKey`].
///
/// Cheap to clone; clones share the same keys. Must be used from within a
/// Tokio runtime since key actors are spawned lazily.
#[derive(Clone)]
pub struct StreamHub {
	inner: Arc<HubInner>,
}

struct HubInner {
	config: HubConfig,
	capture: Option<Arc<dyn CaptureSource>>,
	keys: Mutex<HashMap<StreamKey, mpsc::UnboundedSender<Command>>>,
	next_subscriber: AtomicU64,
}

impl StreamHub {
	/// A hub for direct events only; polled keys never capture.
	pub fn new(config: HubConfig) -> Self {
		Self::build(config, None)
	}

	pub fn with_capture_source(config: HubConfig, capture: Arc<dyn CaptureSource>) -> Self {
		Self::build(config, Some(capture))
	}

	fn build(config: HubConfig, capture: Option<Arc<dyn CaptureSource>>) -> Self {
		Self {
			inner: Arc::new(HubInner {
				config,
				capture,
				keys: Mutex::new(HashMap::new()),
				next_subscriber: AtomicU64::new(1),
			}),
		}
	}

	pub fn config(&self) -> &HubConfig {
		&self.inner.config
	}

	/// Append an entry to the key's ring buffer and deliver it live.
	pub fn publish(&self, key: &StreamKey, entry: LogEntry) {
		self.send(key, Command::Publish(entry));
	}

	/// Register a subscriber.
	///
	/// The returned subscription yields the replay before any live record.
	pub fn subscribe(&self, key: &StreamKey) -> Subscription {
		let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
		let (tx, rx) = mpsc::unbounded_channel();
		let control = self.sender(key);
		let _ = control.send(Command::Subscribe { id, tx });
		Subscription::new(id, key.clone(), rx, control)
	}

	/// Bind a polled key to the external session it captures.
	pub fn attach_session(&self, key: &StreamKey, session: impl Into<String>) {
		self.send(key, Command::AttachSession(session.into()));
	}

	/// Stop polling and forget the last capture, e.g. after the session is killed.
	pub fn detach_session(&self, key: &StreamKey) {
		self.send(key, Command::DetachSession);
	}

	/// Begin polling an attached key.
	///
	/// With no subscribers the poller takes a single capture, so a later
	/// subscriber's replay is current, and then stops.
	pub fn start_polling(&self, key: &StreamKey) {
		self.send(key, Command::StartPolling);
	}

	/// Stats for a key, or `None` if the key has never been used.
	pub async fn stats(&self, key: &StreamKey) -> Option<KeyStats> {
		let control = self.inner.keys.lock().get(key).cloned()?;
		let (reply, rx) = oneshot::channel();
		control.send(Command::Stats(reply)).ok()?;
		rx.await.ok()
	}

	fn send(&self, key: &StreamKey, command: Command) {
		if self.sender(key).send(command).is_err() {
			debug!(key = %key, "stream actor gone, dropping command");
		}
	}

	fn sender(&self, key: &StreamKey) -> mpsc::UnboundedSender<Command> {
		let mut keys = self.inner.keys.lock();
		if let Some(tx) = keys.get(key) {
			if !tx.is_closed() {
				return tx.clone();
			}
		}

		let (tx, rx) = mpsc::unbounded_channel();
		let actor = KeyActor::new(
			key.clone(),
			self.inner.config.buffer_capacity,
			self.inner.config.poll_interval,
			self.inner.capture.clone(),
			tx.downgrade(),
		);
		tokio::spawn(actor.run(rx));
		debug!(key = %key, "stream actor spawned");
		keys.insert(key.clone(), tx.clone());
		tx
	}
}
