use super::AppState;
use crate::domain::events::ChangeEvent;
use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::StreamExt;
use std::convert::Infallible;
use std::time::Duration;
use tracing::info;

// Idle connections still get written to, so dead clients surface as write errors
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// `GET /events`: one subscription per connection, relayed until the client
/// goes away or the server shuts down. The subscription is dropped with the
/// response stream.
pub async fn stream(State(state): State<AppState>) -> impl IntoResponse {
    let subscription = state.broadcaster.subscribe();
    info!(
        subscriber = subscription.id(),
        total = state.broadcaster.subscriber_count(),
        "Client connected"
    );

    let events = subscription
        .into_stream()
        .map(|change| Ok::<_, Infallible>(Event::default().data(event_data(&change))));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)),
    )
}

/// Message text for one `data:` line. File names may legally contain line
/// breaks, which an SSE field cannot carry, so they are written escaped.
fn event_data(change: &ChangeEvent) -> String {
    change
        .to_string()
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}
