use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::{AppState, ServerEvent};

/// GET /api/events: SSE stream of `notification` and `update` events.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        let event = match msg.ok()? {
            ServerEvent::Update => Event::default().event("update").data("update"),
            ServerEvent::Notification(n) => Event::default()
                .event("notification")
                .json_data(&n)
                .ok()?,
        };
        Some(Ok::<Event, Infallible>(event))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
