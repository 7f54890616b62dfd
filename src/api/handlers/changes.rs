use crate::feed::{Change, ChangeFeed};
use axum::{
    extract::Extension,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures_util::Stream;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

const KEEP_ALIVE_SECONDS: u64 = 15;

#[utoipa::path(
    get,
    path = "/v1/changes",
    responses(
        (status = 200, description = "Server-sent `change` events naming the table that changed", content_type = "text/event-stream", body = Change)
    ),
    tag = "media"
)]
// axum handler for the change feed
pub async fn changes(feed: Extension<ChangeFeed>) -> impl IntoResponse {
    // Subscribe before returning so nothing published after the response
    // starts is missed.
    let stream = change_events(feed.0.subscribe());
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(KEEP_ALIVE_SECONDS)))
}

fn change_events(
    mut receiver: tokio::sync::broadcast::Receiver<Change>,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    async_stream::stream! {
        yield Ok(Event::default().event("ready").data("listening"));

        loop {
            match receiver.recv().await {
                Ok(change) => {
                    debug!(table = change.table.as_str(), "forwarding change");
                    yield Event::default().event("change").json_data(change);
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Every notice means "re-fetch", so skipping ahead loses nothing.
                    warn!(skipped, "change subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
