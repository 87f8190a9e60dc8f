// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use branchbox_stream::Subscription;
use tokio_stream::{Stream, StreamExt};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Frame a subscription as SSE: `log` events carry a `LogEntry`, `refresh`
/// events carry the full console screen.
///
/// Dropping the response drops the subscription, which unsubscribes it.
pub(crate) fn event_stream(
	subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	let key = subscription.key().to_string();
	tracing::debug!(key = %key, "stream opened");

	let events = subscription.filter_map(move |event| match serde_json::to_string(&event) {
		Ok(json) => Some(Ok::<_, Infallible>(
			Event::default().event(event.event_name()).data(json),
		)),
		Err(e) => {
			tracing::warn!(key = %key, error = %e, "failed to serialize stream event");
			None
		}
	});

	Sse::new(events).keep_alive(
		KeepAlive::new()
			.interval(KEEP_ALIVE_INTERVAL)
			.text("keep-alive"),
	)
}
