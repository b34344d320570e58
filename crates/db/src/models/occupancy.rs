use parking_core::spot::Occupancy;
use parking_core::types::{DbId, SpotNumber, Timestamp};
use sqlx::FromRow;

/// A row from the `occupancies` table joined with its spot number.
#[derive(Debug, Clone, FromRow)]
pub struct OccupancyRow {
    pub id: DbId,
    pub spot_id: DbId,
    pub spot_number: SpotNumber,
    pub occupant_name: String,
    pub entry_time: Timestamp,
    pub exit_time: Option<Timestamp>,
    pub active: bool,
    pub pin: Option<String>,
}

impl From<OccupancyRow> for Occupancy {
    fn from(row: OccupancyRow) -> Self {
        Occupancy {
            id: row.id,
            spot_id: row.spot_id,
            spot_number: row.spot_number,
            occupant_name: row.occupant_name,
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            active: row.active,
            pin: row.pin,
        }
    }
}
