// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-key actor owning the ring buffer, subscribers and poller.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use branchbox_core::{LogEntry, RefreshEvent, StreamEvent, StreamKey};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::capture::CaptureSource;
use crate::diff::{diff_capture, normalize_capture, CaptureDelta};
use crate::hub::KeyStats;

pub(crate) type SubscriberId = u64;

pub(crate) enum Command {
	Publish(LogEntry),
	Subscribe {
		id: SubscriberId,
		tx: mpsc::UnboundedSender<StreamEvent>,
	},
	Unsubscribe(SubscriberId),
	AttachSession(String),
	DetachSession,
	StartPolling,
	Captured(String),
	CaptureFailed(String),
	Stats(oneshot::Sender<KeyStats>),
}

pub(crate) struct KeyActor {
	key: StreamKey,
	capacity: usize,
	poll_interval: Duration,
	capture: Option<Arc<dyn CaptureSource>>,
	/// Handed to pollers so captures re-enter the actor's queue
	commands: mpsc::WeakUnboundedSender<Command>,
	buffer: VecDeque<LogEntry>,
	subscribers: BTreeMap<SubscriberId, mpsc::UnboundedSender<StreamEvent>>,
	session: Option<String>,
	last_capture: Option<String>,
	poller: Option<JoinHandle<()>>,
}

impl KeyActor {
	pub(crate) fn new(
		key: StreamKey,
		capacity: usize,
		poll_interval: Duration,
		capture: Option<Arc<dyn CaptureSource>>,
		commands: mpsc::WeakUnboundedSender<Command>,
	) -> Self {
		Self {
			key,
			capacity: capacity.max(1),
			poll_interval,
			capture,
			commands,
			buffer: VecDeque::with_capacity(capacity.clamp(1, 2048)),
			subscribers: BTreeMap::new(),
			session: None,
			last_capture: None,
			poller: None,
		}
	}

	pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
		while let Some(command) = rx.recv().await {
			self.handle(command);
		}
		self.stop_polling();
		debug!(key = %self.key, "stream actor finished");
	}

	fn handle(&mut self, command: Command) {
		match command {
			Command::Publish(entry) => {
				if self.buffer.len() >= self.capacity {
					self.buffer.pop_front();
				}
				self.buffer.push_back(entry.clone());
				self.broadcast(StreamEvent::Log(entry));
			}
			Command::Subscribe { id, tx } => self.subscribe(id, tx),
			Command::Unsubscribe(id) => {
				if self.subscribers.remove(&id).is_some() {
					debug!(key = %self.key, subscriber = id, remaining = self.subscribers.len(), "subscriber left");
				}
				self.stop_polling_if_idle();
			}
			Command::AttachSession(session) => {
				if self.session.as_deref() != Some(session.as_str()) {
					self.stop_polling();
					self.last_capture = None;
					self.session = Some(session);
				}
				if !self.subscribers.is_empty() {
					self.start_polling();
				}
			}
			Command::DetachSession => {
				self.stop_polling();
				self.session = None;
				self.last_capture = None;
			}
			Command::StartPolling => self.start_polling(),
			Command::Captured(raw) => {
				self.apply_capture(&raw);
				self.stop_polling_if_idle();
			}
			Command::CaptureFailed(message) => {
				warn!(key = %self.key, error = %message, "capture failed, polling stopped");
				self.stop_polling();
				self.broadcast(StreamEvent::Log(LogEntry::error(message)));
			}
			Command::Stats(reply) => {
				let _ = reply.send(KeyStats {
					subscribers: self.subscribers.len(),
					buffered: self.buffer.len(),
					polling: self.poller.is_some(),
					session: self.session.clone(),
				});
			}
		}
	}

	fn subscribe(&mut self, id: SubscriberId, tx: mpsc::UnboundedSender<StreamEvent>) {
		if self.is_polled() {
			if let Some(capture) = &self.last_capture {
				let _ = tx.send(StreamEvent::Refresh(RefreshEvent::new(capture.clone())));
			}
		} else {
			for entry in &self.buffer {
				if tx.send(StreamEvent::Log(entry.clone())).is_err() {
					return;
				}
			}
		}

		self.subscribers.insert(id, tx);
		debug!(key = %self.key, subscriber = id, total = self.subscribers.len(), "subscriber joined");

		if self.is_polled() {
			self.start_polling();
		}
	}

	fn is_polled(&self) -> bool {
		self.session.is_some() || self.key.is_polled()
	}

	fn apply_capture(&mut self, raw: &str) {
		let capture = normalize_capture(raw);
		match diff_capture(self.last_capture.as_deref(), &capture) {
			CaptureDelta::Unchanged => {}
			CaptureDelta::Append(lines) => {
				trace!(key = %self.key, lines = lines.len(), "capture appended");
				for line in lines {
					self.broadcast(StreamEvent::Log(LogEntry::stdout(line)));
				}
			}
			CaptureDelta::Refresh(content) => {
				trace!(key = %self.key, bytes = content.len(), "capture refreshed");
				self.broadcast(StreamEvent::Refresh(RefreshEvent::new(content)));
			}
		}
		self.last_capture = Some(capture);
	}

	fn broadcast(&mut self, event: StreamEvent) {
		self.subscribers
			.retain(|_, tx| tx.send(event.clone()).is_ok());
	}

	fn start_polling(&mut self) {
		if self.poller.as_ref().is_some_and(|p| !p.is_finished()) {
			return;
		}
		let (Some(capture), Some(session)) = (self.capture.clone(), self.session.clone()) else {
			return;
		};
		let Some(commands) = self.commands.upgrade() else {
			return;
		};

		debug!(key = %self.key, session = %session, "polling started");
		self.poller = Some(tokio::spawn(poll_loop(
			capture,
			session,
			self.poll_interval,
			commands,
		)));
	}

	fn stop_polling_if_idle(&mut self) {
		if self.subscribers.is_empty() {
			self.stop_polling();
		}
	}

	fn stop_polling(&mut self) {
		if let Some(poller) = self.poller.take() {
			poller.abort();
			debug!(key = %self.key, "polling stopped");
		}
	}
}

async fn poll_loop(
	capture: Arc<dyn CaptureSource>,
	session: String,
	interval: Duration,
	commands: mpsc::UnboundedSender<Command>,
) {
	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

	loop {
		ticker.tick().await;
		let command = match capture.capture(&session).await {
			Ok(text) => Command::Captured(text),
			Err(e) => Command::CaptureFailed(e.to_string()),
		};
		if commands.send(command).is_err() {
			break;
		}
	}
}
