//! Outbound notification contract.
//!
//! The parking service calls a [`ParkingNotifier`] after every successful
//! state change. Implementations must not block: delivery is
//! fire-and-forget and can never undo the change that triggered it.

use serde::{Deserialize, Serialize};

use crate::spot::{LotStatus, Occupancy};
use crate::types::{SpotNumber, Timestamp};

/// A single spot changed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotChange {
    pub spot_number: SpotNumber,
    pub occupied: bool,
    pub occupant_name: Option<String>,
    pub entry_time: Option<Timestamp>,
}

impl SpotChange {
    /// The spot was taken by `occupancy`.
    pub fn occupied_by(occupancy: &Occupancy) -> Self {
        Self {
            spot_number: occupancy.spot_number,
            occupied: true,
            occupant_name: Some(occupancy.occupant_name.clone()),
            entry_time: Some(occupancy.entry_time),
        }
    }

    /// The spot became free.
    pub fn freed(spot_number: SpotNumber) -> Self {
        Self {
            spot_number,
            occupied: false,
            occupant_name: None,
            entry_time: None,
        }
    }
}

/// Lot-wide counts pushed to viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub free_count: i64,
    pub occupied_count: i64,
}

impl From<LotStatus> for StatusChange {
    fn from(status: LotStatus) -> Self {
        Self {
            free_count: status.free,
            occupied_count: status.occupied,
        }
    }
}

/// Receiver of parking state changes.
pub trait ParkingNotifier: Send + Sync {
    fn spot_changed(&self, change: SpotChange);

    fn status_changed(&self, status: StatusChange);
}

/// Notifier that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ParkingNotifier for NoopNotifier {
    fn spot_changed(&self, _change: SpotChange) {}

    fn status_changed(&self, _status: StatusChange) {}
}
