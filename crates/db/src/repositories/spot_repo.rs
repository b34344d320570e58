//! Repository for the `spots` table.

use chrono::Utc;
use parking_core::spot::NewSpot;
use parking_core::types::{DbId, SpotNumber, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::spot::{SpotRow, SpotViewRow};

/// Column list for `spots` queries.
const COLUMNS: &str = "id, number, side, occupied, link_token";

/// Spot columns left-joined with the active occupancy, aliased `s` / `o`.
const VIEW_SELECT: &str = "\
    SELECT s.number, s.side, s.occupied, o.occupant_name, o.entry_time \
    FROM spots s \
    LEFT JOIN occupancies o ON o.spot_id = s.id AND o.active";

/// Provides queries over parking spots.
pub struct SpotRepo;

impl SpotRepo {
    /// Take a lock that serializes concurrent bootstraps while still
    /// allowing reads.
    pub async fn lock_for_seeding(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query("LOCK TABLE spots IN SHARE ROW EXCLUSIVE MODE")
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn count(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM spots")
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    /// Insert all `spots` in a single statement. Returns the rows inserted.
    pub async fn insert_many(conn: &mut PgConnection, spots: &[NewSpot]) -> Result<u64, sqlx::Error> {
        let numbers: Vec<SpotNumber> = spots.iter().map(|s| s.number).collect();
        let sides: Vec<&str> = spots.iter().map(|s| s.side.as_str()).collect();
        let tokens: Vec<&str> = spots.iter().map(|s| s.link_token.as_str()).collect();

        let result = sqlx::query(
            "INSERT INTO spots (number, side, link_token, created_at) \
             SELECT number, side, link_token, $4 \
             FROM UNNEST($1::INTEGER[], $2::TEXT[], $3::TEXT[]) AS t(number, side, link_token)",
        )
        .bind(&numbers)
        .bind(&sides)
        .bind(&tokens)
        .bind(Utc::now())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// All spots with their active occupancy, ordered by number.
    pub async fn list_views(pool: &PgPool) -> Result<Vec<SpotViewRow>, sqlx::Error> {
        let query = format!("{VIEW_SELECT} ORDER BY s.number ASC");
        sqlx::query_as::<_, SpotViewRow>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_view(pool: &PgPool, number: SpotNumber) -> Result<Option<SpotViewRow>, sqlx::Error> {
        let query = format!("{VIEW_SELECT} WHERE s.number = $1");
        sqlx::query_as::<_, SpotViewRow>(&query)
            .bind(number)
            .fetch_optional(pool)
            .await
    }

    /// Find a spot by number and lock its row until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        number: SpotNumber,
    ) -> Result<Option<SpotRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM spots WHERE number = $1 FOR UPDATE");
        sqlx::query_as::<_, SpotRow>(&query)
            .bind(number)
            .fetch_optional(conn)
            .await
    }

    /// Lock, in id order, every spot holding an active occupancy that
    /// started before `cutoff`. Returns the locked spot ids.
    pub async fn lock_with_stale_occupancy(
        conn: &mut PgConnection,
        cutoff: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT s.id FROM spots s \
             WHERE EXISTS ( \
                 SELECT 1 FROM occupancies o \
                 WHERE o.spot_id = s.id AND o.active AND o.entry_time < $1 \
             ) \
             ORDER BY s.id \
             FOR UPDATE",
        )
        .bind(cutoff)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn set_occupied(
        conn: &mut PgConnection,
        id: DbId,
        occupied: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE spots SET occupied = $1 WHERE id = $2")
            .bind(occupied)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Mark several spots free at once.
    pub async fn set_free_many(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE spots SET occupied = false WHERE id = ANY($1)")
            .bind(ids)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Total and occupied spot counts.
    pub async fn status_counts(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE occupied) FROM spots",
        )
        .fetch_one(pool)
        .await
    }
}
