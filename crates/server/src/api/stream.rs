//! Live job stream over SSE.
//!
//! Bridges a hub subscription onto the HTTP response: JSON data frames for
//! snapshot and new-jobs events, comment frames for heartbeats. Slow clients
//! stall the forwarding task, the hub mailbox fills up, and the hub starts
//! dropping batches for this subscriber only.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use jobcast_pipeline::StreamEvent;

use crate::state::AppState;

use super::{api_error, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    responses(
        (status = 200, description = "SSE stream: one snapshot event first, then new_jobs batches; idle gaps carry comment keepalives")
    )
)]
pub async fn events(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<ReceiverStream<Result<Event, Infallible>>>, (StatusCode, Json<ErrorResponse>)> {
    let mut subscriber = state.coordinator.subscribe().map_err(api_error)?;
    let coordinator = Arc::clone(&state.coordinator);

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(16);
    tokio::spawn(async move {
        loop {
            let event = match subscriber.next_event().await {
                Some(StreamEvent::Heartbeat) => Event::default().comment("keep-alive"),
                Some(payload) => match serde_json::to_string(&payload) {
                    Ok(json) => Event::default().data(json),
                    Err(err) => {
                        warn!(error = %err, "failed to encode stream event");
                        continue;
                    }
                },
                None => break,
            };
            if tx.send(Ok(event)).await.is_err() {
                // client hung up
                break;
            }
        }
        coordinator.unsubscribe(&subscriber);
        debug!(subscriber = %subscriber.id, "event stream closed");
    });

    Ok(Sse::new(ReceiverStream::new(rx)))
}
