// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::pin::Pin;
use std::task::{Context, Poll};

use branchbox_core::{StreamEvent, StreamKey};
use futures::Stream;
use tokio::sync::mpsc;

use crate::actor::{Command, SubscriberId};

/// A live viewer of one stream key.
///
/// Dropping the subscription removes the subscriber; when it was the last
/// one, polling for the key stops.
pub struct Subscription {
	id: SubscriberId,
	key: StreamKey,
	events: mpsc::UnboundedReceiver<StreamEvent>,
	control: mpsc::UnboundedSender<Command>,
}

impl Subscription {
	pub(crate) fn new(
		id: SubscriberId,
		key: StreamKey,
		events: mpsc::UnboundedReceiver<StreamEvent>,
		control: mpsc::UnboundedSender<Command>,
	) -> Self {
		Self {
			id,
			key,
			events,
			control,
		}
	}

	pub fn key(&self) -> &StreamKey {
		&self.key
	}

	/// Next record, or `None` once the key's actor is gone.
	pub async fn recv(&mut self) -> Option<StreamEvent> {
		self.events.recv().await
	}
}

impl Stream for Subscription {
	type Item = StreamEvent;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.events.poll_recv(cx)
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		let _ = self.control.send(Command::Unsubscribe(self.id));
	}
}
