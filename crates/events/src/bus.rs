//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ParkingEvent`]s. It is
//! shared via `Arc<EventBus>` between the parking service (publisher) and
//! the WebSocket fan-out (subscriber).

use parking_core::notify::{ParkingNotifier, SpotChange, StatusChange};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ParkingEvent
// ---------------------------------------------------------------------------

/// A state change pushed to viewers.
///
/// Serialized as `{"type": "spot_changed", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ParkingEvent {
    SpotChanged(SpotChange),
    StatusChanged(StatusChange),
}

impl ParkingEvent {
    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ParkingEvent::SpotChanged(_) => "spot_changed",
            ParkingEvent::StatusChanged(_) => "status_changed",
        }
    }

    /// JSON text frame for this event.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use parking_core::notify::SpotChange;
/// use parking_events::bus::{EventBus, ParkingEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ParkingEvent::SpotChanged(SpotChange::freed(3)));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ParkingEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Never blocks. With no subscribers the event is dropped.
    pub fn publish(&self, event: ParkingEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No event bus subscribers, event dropped");
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ParkingEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ParkingNotifier for EventBus {
    fn spot_changed(&self, change: SpotChange) {
        self.publish(ParkingEvent::SpotChanged(change));
    }

    fn status_changed(&self, status: StatusChange) {
        self.publish(ParkingEvent::StatusChanged(status));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.spot_changed(SpotChange {
            spot_number: 4,
            occupied: true,
            occupant_name: Some("Ana".into()),
            entry_time: None,
        });

        let received = rx.recv().await.expect("should receive the event");
        match received {
            ParkingEvent::SpotChanged(change) => {
                assert_eq!(change.spot_number, 4);
                assert!(change.occupied);
                assert_eq!(change.occupant_name.as_deref(), Some("Ana"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.status_changed(StatusChange {
            free_count: 10,
            occupied_count: 40,
        });

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1, e2);
        assert_eq!(e1.kind(), "status_changed");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(ParkingEvent::SpotChanged(SpotChange::freed(1)));
    }

    #[test]
    fn events_serialize_with_type_and_data() {
        let json: serde_json::Value = serde_json::from_str(
            &ParkingEvent::StatusChanged(StatusChange {
                free_count: 47,
                occupied_count: 3,
            })
            .to_json()
            .unwrap(),
        )
        .unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["data"]["free_count"], 47);
        assert_eq!(json["data"]["occupied_count"], 3);

        let json = serde_json::to_value(ParkingEvent::SpotChanged(SpotChange::freed(9))).unwrap();
        assert_eq!(json["type"], "spot_changed");
        assert_eq!(json["data"]["spot_number"], 9);
        assert_eq!(json["data"]["occupied"], false);
        assert!(json["data"]["occupant_name"].is_null());
    }
}
