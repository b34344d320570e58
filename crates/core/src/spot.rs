//! Spot and occupancy domain types.
//!
//! These are the storage-agnostic shapes exchanged between the parking
//! service, the store implementations, and the HTTP layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, SpotNumber, Timestamp};

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which side of the lot a spot sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side for a spot number given the split point: numbers up to and
    /// including `split` are on the left.
    pub fn for_number(number: SpotNumber, split: SpotNumber) -> Self {
        if number <= split {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(CoreError::Internal(format!("Unknown spot side '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Spot
// ---------------------------------------------------------------------------

/// A persisted parking spot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spot {
    pub id: DbId,
    pub number: SpotNumber,
    pub side: Side,
    /// Denormalized: always equal to "this spot has an active occupancy".
    pub occupied: bool,
    /// Opaque, immutable token used for stable deep-links.
    pub link_token: String,
}

/// A spot to be created during lot initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpot {
    pub number: SpotNumber,
    pub side: Side,
    pub link_token: String,
}

/// Read view of a spot joined with its active occupancy, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpotView {
    pub number: SpotNumber,
    pub side: Side,
    pub occupied: bool,
    pub occupant_name: Option<String>,
    pub entry_time: Option<Timestamp>,
}

impl SpotView {
    /// Build the view from a spot and its active occupancy.
    pub fn from_parts(spot: &Spot, active: Option<&Occupancy>) -> Self {
        Self {
            number: spot.number,
            side: spot.side,
            occupied: spot.occupied,
            occupant_name: active.map(|o| o.occupant_name.clone()),
            entry_time: active.map(|o| o.entry_time),
        }
    }
}

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

/// One entry of the occupancy ledger.
///
/// Created on check-in, closed on check-out or timeout, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub id: DbId,
    pub spot_id: DbId,
    pub spot_number: SpotNumber,
    pub occupant_name: String,
    pub entry_time: Timestamp,
    pub exit_time: Option<Timestamp>,
    pub active: bool,
    /// Checkout credential. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub pin: Option<String>,
}

impl Occupancy {
    /// `true` if the occupancy carries a non-empty PIN.
    pub fn has_pin(&self) -> bool {
        self.pin.as_deref().is_some_and(|p| !p.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Lot status
// ---------------------------------------------------------------------------

/// Aggregate counts across the whole lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotStatus {
    pub total: i64,
    pub free: i64,
    pub occupied: i64,
}

impl LotStatus {
    /// Derive the status from the total spot count and the occupied count.
    pub fn from_counts(total: i64, occupied: i64) -> Self {
        Self {
            total,
            free: total - occupied,
            occupied,
        }
    }
}
