use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Interval between heartbeat pings.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// The viewer group: every open WebSocket connection, keyed by connection ID.
///
/// All viewers receive every parking event; there is no per-spot filtering.
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    viewers: RwLock<HashMap<String, WsSender>>,
}

impl WsManager {
    /// Create a new, empty viewer group.
    pub fn new() -> Self {
        Self {
            viewers: RwLock::new(HashMap::new()),
        }
    }

    /// Join a connection to the viewer group.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink. Re-using an ID replaces the
    /// previous connection.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.viewers.write().await.insert(conn_id, tx);
        rx
    }

    /// Join a connection with `first` already queued, ahead of any
    /// broadcast that follows.
    pub async fn add_with_first(
        &self,
        conn_id: String,
        first: Message,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut viewers = self.viewers.write().await;
        let _ = tx.send(first);
        viewers.insert(conn_id, tx);
        rx
    }

    /// Remove a connection from the group.
    pub async fn remove(&self, conn_id: &str) {
        self.viewers.write().await.remove(conn_id);
    }

    /// Broadcast a message to every viewer.
    ///
    /// Viewers whose channels are closed are skipped. Returns the number of
    /// viewers the message was queued for.
    pub async fn broadcast(&self, message: Message) -> usize {
        let viewers = self.viewers.read().await;
        viewers
            .values()
            .filter(|sender| sender.send(message.clone()).is_ok())
            .count()
    }

    /// Return the current number of viewers.
    pub async fn connection_count(&self) -> usize {
        self.viewers.read().await.len()
    }

    /// Send a Close frame to every viewer, then empty the group.
    pub async fn shutdown_all(&self) {
        let mut viewers = self.viewers.write().await;
        let count = viewers.len();
        for sender in viewers.values() {
            let _ = sender.send(Message::Close(None));
        }
        viewers.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Ping every viewer and drop the ones whose channel has closed.
    ///
    /// Returns the number of viewers pruned.
    pub async fn ping_all(&self) -> usize {
        let mut viewers = self.viewers.write().await;
        let before = viewers.len();
        viewers.retain(|_, sender| sender.send(Message::Ping(Bytes::new())).is_ok());
        before - viewers.len()
    }

    /// Spawn the heartbeat task: ping the group every `every`, pruning
    /// viewers that went away without a Close frame.
    ///
    /// The returned handle is aborted during shutdown.
    pub fn spawn_heartbeat(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let pruned = manager.ping_all().await;
                if pruned > 0 {
                    tracing::debug!(pruned, "Dropped unreachable WebSocket viewers");
                }
                let viewers = manager.connection_count().await;
                tracing::trace!(viewers, "Heartbeat");
            }
        })
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
