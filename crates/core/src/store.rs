//! Storage seam for spots and the occupancy ledger.
//!
//! Implementations own the per-spot serialization: every mutating method
//! must lock the spot it touches, evaluate the rules in [`crate::rules`]
//! while holding the lock, and write the ledger row and the spot's
//! `occupied` flag before releasing it.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::spot::{LotStatus, NewSpot, Occupancy, SpotView};
use crate::types::{SpotNumber, Timestamp};

/// Data for a new active occupancy.
#[derive(Debug, Clone)]
pub struct NewOccupancy {
    pub occupant_name: String,
    pub pin: String,
    pub entry_time: Timestamp,
}

/// Credentials presented at checkout.
#[derive(Debug, Clone, Copy)]
pub struct CheckOutCredentials<'a> {
    pub occupant_name: &'a str,
    pub pin: Option<&'a str>,
}

#[async_trait]
pub trait ParkingStore: Send + Sync {
    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), CoreError>;

    /// Create `spots` unless the store already holds at least one spot.
    ///
    /// Returns the number of spots created (`0` when already seeded).
    async fn seed_spots(&self, spots: &[NewSpot]) -> Result<usize, CoreError>;

    /// All spots ordered by number, joined with their active occupancy.
    async fn list_spots(&self) -> Result<Vec<SpotView>, CoreError>;

    /// One spot joined with its active occupancy.
    async fn find_spot(&self, number: SpotNumber) -> Result<Option<SpotView>, CoreError>;

    async fn lot_status(&self) -> Result<LotStatus, CoreError>;

    /// Most recent ledger rows, newest entry first.
    async fn history(&self, limit: i64) -> Result<Vec<Occupancy>, CoreError>;

    /// Open an occupancy on a free spot and mark it occupied, atomically.
    async fn check_in(
        &self,
        number: SpotNumber,
        occupancy: NewOccupancy,
    ) -> Result<Occupancy, CoreError>;

    /// Close the active occupancy of a spot and mark it free, atomically.
    ///
    /// Returns the closed occupancy.
    async fn check_out(
        &self,
        number: SpotNumber,
        credentials: CheckOutCredentials<'_>,
        exit_time: Timestamp,
    ) -> Result<Occupancy, CoreError>;

    /// Close every active occupancy that started before `cutoff`.
    ///
    /// Records that were closed concurrently are skipped, never closed
    /// twice. Returns the occupancies closed by this call.
    async fn expire_before(
        &self,
        cutoff: Timestamp,
        exit_time: Timestamp,
    ) -> Result<Vec<Occupancy>, CoreError>;
}
