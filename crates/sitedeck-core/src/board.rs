// ── Active-build board ──
//
// Latest active-build list behind a `watch` channel. The console writes
// after each refresh; views subscribe and wait for changes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures_util::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Build;

/// Point-in-time view of the board.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub builds: Arc<Vec<Build>>,
    /// `false` until the first refresh finishes.
    pub loaded: bool,
    /// Message of the last failed refresh, cleared by the next success.
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Shared, observable holder of the active-build list.
pub struct BuildBoard {
    tx: watch::Sender<BoardSnapshot>,
}

impl BuildBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(BoardSnapshot::default());
        Self { tx }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> BoardSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> BoardSubscription {
        BoardSubscription::new(self.tx.subscribe())
    }

    /// Replace the build list and notify subscribers.
    pub fn publish(&self, builds: Arc<Vec<Build>>) {
        self.tx.send_modify(|snap| {
            snap.builds = builds;
            snap.loaded = true;
            snap.error = None;
            snap.updated_at = Some(Utc::now());
        });
    }

    /// Record a failed refresh. The previous build list stays visible.
    pub fn publish_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|snap| {
            snap.loaded = true;
            snap.error = Some(message);
        });
    }
}

impl Default for BuildBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription to board changes.
pub struct BoardSubscription {
    current: BoardSnapshot,
    receiver: watch::Receiver<BoardSnapshot>,
}

impl BoardSubscription {
    fn new(receiver: watch::Receiver<BoardSnapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot as of subscription or the last `changed()`.
    pub fn current(&self) -> &BoardSnapshot {
        &self.current
    }

    /// Wait for the next publish. Returns `None` once the board is dropped.
    pub async fn changed(&mut self) -> Option<BoardSnapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    pub fn into_stream(self) -> BoardStream {
        BoardStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` of board snapshots, starting with the current one.
pub struct BoardStream {
    inner: WatchStream<BoardSnapshot>,
}

impl Stream for BoardStream {
    type Item = BoardSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn subscribers_see_publishes() {
        let board = BuildBoard::new();
        let mut sub = board.subscribe();
        assert!(!sub.current().loaded);

        board.publish(Arc::new(Vec::new()));
        let snap = sub.changed().await.unwrap();
        assert!(snap.loaded);
        assert!(snap.error.is_none());
        assert!(snap.updated_at.is_some());
    }

    #[tokio::test]
    async fn error_keeps_previous_builds() {
        let board = BuildBoard::new();
        board.publish(Arc::new(Vec::new()));
        let before = board.snapshot().updated_at;

        board.publish_error("network down");
        let snap = board.snapshot();
        assert_eq!(snap.error.as_deref(), Some("network down"));
        assert_eq!(snap.updated_at, before);
    }

    #[tokio::test]
    async fn stream_yields_initial_snapshot() {
        let board = BuildBoard::new();
        let mut stream = board.subscribe().into_stream();
        let first = stream.next().await.unwrap();
        assert!(!first.loaded);
    }

    #[tokio::test]
    async fn changed_ends_when_board_dropped() {
        let board = BuildBoard::new();
        let mut sub = board.subscribe();
        drop(board);
        assert!(sub.changed().await.is_none());
    }
}
