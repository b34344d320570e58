//! Event bus → WebSocket fan-out.

use std::sync::Arc;

use axum::extract::ws::Message;
use parking_events::ParkingEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Forwards parking events to every connected viewer.
///
/// Delivery is best effort: a viewer whose channel is gone is skipped and
/// a lagging subscription drops the missed events with a warning.
pub struct EventFanout {
    ws_manager: Arc<WsManager>,
}

impl EventFanout {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the fan-out loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](parking_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<ParkingEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.deliver(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event fan-out lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, fan-out shutting down");
                    break;
                }
            }
        }
    }

    /// Serialize one event and broadcast it to the viewer group.
    ///
    /// Returns the number of connections it was queued for.
    pub async fn deliver(&self, event: &ParkingEvent) -> usize {
        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, event_type = event.kind(), "Failed to serialize event");
                return 0;
            }
        };

        let delivered = self.ws_manager.broadcast(Message::Text(json.into())).await;
        tracing::debug!(event_type = event.kind(), delivered, "Event delivered to viewers");
        delivered
    }
}
