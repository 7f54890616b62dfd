//! Change feed for media and live-stream tables.
//!
//! Privileged handlers publish a bare "table changed" notice after each
//! successful mutation; subscribers are expected to re-fetch the whole table.
//! Nothing is buffered beyond the channel capacity and nothing is replayed: a
//! lagging subscriber skips ahead, which is harmless since every notice means
//! the same thing.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use utoipa::ToSchema;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Videos,
    Photos,
    YoutubeSettings,
}

impl Table {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Videos => "videos",
            Self::Photos => "photos",
            Self::YoutubeSettings => "youtube_settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Change {
    pub table: Table,
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Change>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Notify subscribers that `table` changed. A feed nobody listens to is fine.
    pub fn publish(&self, table: Table) {
        match self.sender.send(Change { table }) {
            Ok(receivers) => debug!(table = table.as_str(), receivers, "change published"),
            Err(_) => debug!(table = table.as_str(), "change dropped: no subscribers"),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
