//! [`ParkingStore`] over PostgreSQL.
//!
//! Every mutation runs in one transaction that first locks the affected
//! spot rows (`SELECT ... FOR UPDATE`), then the occupancy rows. The lock
//! order spot → occupancy is the same for check-in, check-out and the
//! expiry sweep.

use async_trait::async_trait;
use parking_core::error::CoreError;
use parking_core::rules;
use parking_core::spot::{LotStatus, NewSpot, Occupancy, Spot, SpotView};
use parking_core::store::{CheckOutCredentials, NewOccupancy, ParkingStore};
use parking_core::types::{SpotNumber, Timestamp};

use crate::error::into_core;
use crate::repositories::{OccupancyRepo, SpotRepo};
use crate::DbPool;

/// Database-backed spot store and occupancy ledger.
#[derive(Clone)]
pub struct PgParkingStore {
    pool: DbPool,
}

impl PgParkingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParkingStore for PgParkingStore {
    async fn ping(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(into_core)
    }

    async fn seed_spots(&self, spots: &[NewSpot]) -> Result<usize, CoreError> {
        let mut tx = self.pool.begin().await.map_err(into_core)?;

        SpotRepo::lock_for_seeding(&mut tx).await.map_err(into_core)?;
        if SpotRepo::count(&mut tx).await.map_err(into_core)? > 0 {
            return Ok(0);
        }
        let inserted = SpotRepo::insert_many(&mut tx, spots)
            .await
            .map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;
        Ok(inserted as usize)
    }

    async fn list_spots(&self) -> Result<Vec<SpotView>, CoreError> {
        SpotRepo::list_views(&self.pool)
            .await
            .map_err(into_core)?
            .into_iter()
            .map(SpotView::try_from)
            .collect()
    }

    async fn find_spot(&self, number: SpotNumber) -> Result<Option<SpotView>, CoreError> {
        SpotRepo::find_view(&self.pool, number)
            .await
            .map_err(into_core)?
            .map(SpotView::try_from)
            .transpose()
    }

    async fn lot_status(&self) -> Result<LotStatus, CoreError> {
        let (total, occupied) = SpotRepo::status_counts(&self.pool)
            .await
            .map_err(into_core)?;
        Ok(LotStatus::from_counts(total, occupied))
    }

    async fn history(&self, limit: i64) -> Result<Vec<Occupancy>, CoreError> {
        let rows = OccupancyRepo::list_recent(&self.pool, limit)
            .await
            .map_err(into_core)?;
        Ok(rows.into_iter().map(Occupancy::from).collect())
    }

    async fn check_in(
        &self,
        number: SpotNumber,
        occupancy: NewOccupancy,
    ) -> Result<Occupancy, CoreError> {
        let mut tx = self.pool.begin().await.map_err(into_core)?;

        let spot = SpotRepo::find_for_update(&mut tx, number)
            .await
            .map_err(into_core)?
            .map(Spot::try_from)
            .transpose()?;
        let spot = rules::ensure_can_check_in(number, spot.as_ref())?;

        let row = OccupancyRepo::create(&mut tx, spot.id, spot.number, &occupancy)
            .await
            .map_err(into_core)?;
        SpotRepo::set_occupied(&mut tx, spot.id, true)
            .await
            .map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;
        Ok(row.into())
    }

    async fn check_out(
        &self,
        number: SpotNumber,
        credentials: CheckOutCredentials<'_>,
        exit_time: Timestamp,
    ) -> Result<Occupancy, CoreError> {
        let mut tx = self.pool.begin().await.map_err(into_core)?;

        let spot = SpotRepo::find_for_update(&mut tx, number)
            .await
            .map_err(into_core)?
            .map(Spot::try_from)
            .transpose()?;
        let active = match &spot {
            Some(spot) => OccupancyRepo::find_active_for_update(&mut tx, spot.id)
                .await
                .map_err(into_core)?
                .map(Occupancy::from),
            None => None,
        };

        let record = rules::ensure_can_check_out(
            number,
            spot.as_ref(),
            active.as_ref(),
            credentials.occupant_name,
            credentials.pin,
        )?;

        let closed = OccupancyRepo::close(&mut tx, record.id, exit_time)
            .await
            .map_err(into_core)?
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "Occupancy {} closed while spot {number} was locked",
                    record.id
                ))
            })?;
        SpotRepo::set_occupied(&mut tx, record.spot_id, false)
            .await
            .map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;
        Ok(closed.into())
    }

    async fn expire_before(
        &self,
        cutoff: Timestamp,
        exit_time: Timestamp,
    ) -> Result<Vec<Occupancy>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(into_core)?;

        let spot_ids = SpotRepo::lock_with_stale_occupancy(&mut tx, cutoff)
            .await
            .map_err(into_core)?;
        if spot_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Re-checked under the spot locks: a check-out that committed while
        // we waited has already closed its row and is skipped here.
        let closed = OccupancyRepo::close_stale(&mut tx, &spot_ids, cutoff, exit_time)
            .await
            .map_err(into_core)?;
        let freed: Vec<_> = closed.iter().map(|row| row.spot_id).collect();
        SpotRepo::set_free_many(&mut tx, &freed)
            .await
            .map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;
        Ok(closed.into_iter().map(Occupancy::from).collect())
    }
}
