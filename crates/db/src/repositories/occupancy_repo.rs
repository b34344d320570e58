//! Repository for the `occupancies` ledger.

use parking_core::store::NewOccupancy;
use parking_core::types::{DbId, SpotNumber, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::occupancy::OccupancyRow;

/// Occupancy columns joined with the spot number, aliased `o` / `s`.
const COLUMNS: &str = "\
    o.id, o.spot_id, s.number AS spot_number, o.occupant_name, \
    o.entry_time, o.exit_time, o.active, o.pin";

/// Provides ledger queries. Rows are never deleted.
pub struct OccupancyRepo;

impl OccupancyRepo {
    /// Insert a new active occupancy for `spot_id`.
    pub async fn create(
        conn: &mut PgConnection,
        spot_id: DbId,
        spot_number: SpotNumber,
        input: &NewOccupancy,
    ) -> Result<OccupancyRow, sqlx::Error> {
        sqlx::query_as::<_, OccupancyRow>(
            "INSERT INTO occupancies (spot_id, occupant_name, entry_time, active, pin) \
             VALUES ($1, $2, $3, true, $4) \
             RETURNING id, spot_id, $5::INTEGER AS spot_number, occupant_name, \
                       entry_time, exit_time, active, pin",
        )
        .bind(spot_id)
        .bind(&input.occupant_name)
        .bind(input.entry_time)
        .bind(&input.pin)
        .bind(spot_number)
        .fetch_one(conn)
        .await
    }

    /// The active occupancy of a spot, row-locked until the transaction ends.
    pub async fn find_active_for_update(
        conn: &mut PgConnection,
        spot_id: DbId,
    ) -> Result<Option<OccupancyRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM occupancies o \
             JOIN spots s ON s.id = o.spot_id \
             WHERE o.spot_id = $1 AND o.active \
             FOR UPDATE OF o"
        );
        sqlx::query_as::<_, OccupancyRow>(&query)
            .bind(spot_id)
            .fetch_optional(conn)
            .await
    }

    /// Close an occupancy if it is still active.
    ///
    /// Returns `None` when the row was already closed.
    pub async fn close(
        conn: &mut PgConnection,
        id: DbId,
        exit_time: Timestamp,
    ) -> Result<Option<OccupancyRow>, sqlx::Error> {
        let query = format!(
            "UPDATE occupancies o SET active = false, exit_time = $2 \
             FROM spots s \
             WHERE o.id = $1 AND o.active AND s.id = o.spot_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OccupancyRow>(&query)
            .bind(id)
            .bind(exit_time)
            .fetch_optional(conn)
            .await
    }

    /// Close the still-active occupancies of `spot_ids` that started
    /// before `cutoff`.
    pub async fn close_stale(
        conn: &mut PgConnection,
        spot_ids: &[DbId],
        cutoff: Timestamp,
        exit_time: Timestamp,
    ) -> Result<Vec<OccupancyRow>, sqlx::Error> {
        let query = format!(
            "UPDATE occupancies o SET active = false, exit_time = $3 \
             FROM spots s \
             WHERE s.id = o.spot_id AND o.spot_id = ANY($1) \
               AND o.active AND o.entry_time < $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OccupancyRow>(&query)
            .bind(spot_ids)
            .bind(cutoff)
            .bind(exit_time)
            .fetch_all(conn)
            .await
    }

    /// Most recent occupancies, newest entry first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<OccupancyRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM occupancies o \
             JOIN spots s ON s.id = o.spot_id \
             ORDER BY o.entry_time DESC, o.id DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, OccupancyRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
