use parking_core::error::CoreError;
use parking_core::spot::{Spot, SpotView};
use parking_core::types::{DbId, SpotNumber, Timestamp};
use sqlx::FromRow;

/// A row from the `spots` table.
#[derive(Debug, Clone, FromRow)]
pub struct SpotRow {
    pub id: DbId,
    pub number: SpotNumber,
    pub side: String,
    pub occupied: bool,
    pub link_token: String,
}

impl TryFrom<SpotRow> for Spot {
    type Error = CoreError;

    fn try_from(row: SpotRow) -> Result<Self, Self::Error> {
        Ok(Spot {
            id: row.id,
            number: row.number,
            side: row.side.parse()?,
            occupied: row.occupied,
            link_token: row.link_token,
        })
    }
}

/// A spot left-joined with its active occupancy.
#[derive(Debug, Clone, FromRow)]
pub struct SpotViewRow {
    pub number: SpotNumber,
    pub side: String,
    pub occupied: bool,
    pub occupant_name: Option<String>,
    pub entry_time: Option<Timestamp>,
}

impl TryFrom<SpotViewRow> for SpotView {
    type Error = CoreError;

    fn try_from(row: SpotViewRow) -> Result<Self, Self::Error> {
        Ok(SpotView {
            number: row.number,
            side: row.side.parse()?,
            occupied: row.occupied,
            occupant_name: row.occupant_name,
            entry_time: row.entry_time,
        })
    }
}
