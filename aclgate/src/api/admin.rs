//! Admin service (`main.Admin`) server streams
//!
//! `Logging` streams every audit event to the caller as `text/event-stream`
//! frames until the client goes away or the service shuts down.
//! `Statistics` only opens and closes a stream; no aggregation is computed.

use crate::api::error::AppError;
use crate::authz::Consumer;
use crate::common::error::{GateError, StreamDeliveryError};
use crate::events::{Event, Subscription};
use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Frames buffered between the forwarding task and the response body
const FRAME_BUFFER: usize = 16;

/// Comment frame written while the stream is idle
const KEEPALIVE_FRAME: &[u8] = b": keep-alive\n\n";

/// `Statistics` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatInterval {
    /// Aggregation window in seconds
    pub interval_seconds: u64,
}

/// `POST /main.Admin/Logging`
///
/// Registers a subscription before the response head is returned, so every
/// call authorized after the client sees `200 OK` is streamed to it.
pub async fn logging(
    State(state): State<AppState>,
    Extension(consumer): Extension<Consumer>,
) -> Result<Response, AppError> {
    let subscription = state.event_bus.subscribe().await?;
    let subscriber_id = subscription.id();
    let (frames_tx, frames_rx) = mpsc::channel(FRAME_BUFFER);

    debug!(
        consumer = %consumer.as_str(),
        subscriber_id,
        "audit stream opened"
    );

    let keepalive = state.stream_keepalive;
    tokio::spawn(async move {
        if let Err(e) = forward_events(subscription, frames_tx, keepalive).await {
            warn!("{}", e);
        }
        debug!(subscriber_id, "audit stream closed");
    });

    Ok(event_stream_response(frames_rx))
}

/// `POST /main.Admin/Statistics`
///
/// Accepts the interval and ends the stream immediately.
pub async fn statistics(
    Extension(consumer): Extension<Consumer>,
    payload: Result<Json<StatInterval>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(interval) =
        payload.map_err(|e| AppError(GateError::InvalidRequest(e.body_text())))?;

    debug!(
        consumer = %consumer.as_str(),
        interval_seconds = interval.interval_seconds,
        "statistics stream opened (no aggregation available)"
    );

    let (_, frames_rx) = mpsc::channel(1);
    Ok(event_stream_response(frames_rx))
}

/// Drains one subscription into one client's frame channel
///
/// Returns when the subscription is closed (unsubscribe, overflow or bus
/// shutdown) or the client stops reading. The subscription is dropped on
/// every path, which unsubscribes it exactly once.
pub(crate) async fn forward_events(
    mut subscription: Subscription,
    frames: mpsc::Sender<Bytes>,
    keepalive: Duration,
) -> Result<(), StreamDeliveryError> {
    let subscriber_id = subscription.id();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + keepalive, keepalive);

    loop {
        let frame = tokio::select! {
            _ = frames.closed() => {
                debug!(subscriber_id, "audit stream client disconnected");
                return Ok(());
            }
            event = subscription.recv() => match event {
                Some(event) => match encode_frame(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(subscriber_id, "failed to serialize audit event: {}", e);
                        continue;
                    }
                },
                None => {
                    debug!(subscriber_id, "audit subscription closed by event bus");
                    return Ok(());
                }
            },
            _ = ticker.tick() => Bytes::from_static(KEEPALIVE_FRAME),
        };

        if frames.send(frame).await.is_err() {
            return Err(StreamDeliveryError { subscriber_id });
        }
    }
}

/// Encodes one event as a `data:` frame
pub(crate) fn encode_frame(event: &Event) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("data: {}\n\n", json)))
}

fn event_stream_response(frames: mpsc::Receiver<Bytes>) -> Response {
    let stream = futures::stream::unfold(frames, |mut frames| async move {
        frames
            .recv()
            .await
            .map(|frame| (Ok::<_, io::Error>(frame), frames))
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}
