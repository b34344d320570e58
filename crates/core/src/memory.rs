//! In-process [`ParkingStore`] with per-spot locking.
//!
//! Each spot owns a `tokio::sync::Mutex` guarding both the spot row and its
//! slice of the ledger, so the `occupied` flag and the active occupancy are
//! always changed inside one critical section. The spot map is only
//! write-locked while seeding.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::CoreError;
use crate::rules;
use crate::spot::{LotStatus, NewSpot, Occupancy, Spot, SpotView};
use crate::store::{CheckOutCredentials, NewOccupancy, ParkingStore};
use crate::types::{DbId, SpotNumber, Timestamp};

/// A spot together with every occupancy ever recorded for it.
#[derive(Debug)]
struct SpotSlot {
    spot: Spot,
    ledger: Vec<Occupancy>,
}

impl SpotSlot {
    fn active(&self) -> Option<&Occupancy> {
        self.ledger.iter().find(|o| o.active)
    }

    fn view(&self) -> SpotView {
        SpotView::from_parts(&self.spot, self.active())
    }

    /// Close the occupancy `id` and free the spot.
    fn close(&mut self, id: DbId, exit_time: Timestamp) -> Option<Occupancy> {
        let record = self.ledger.iter_mut().find(|o| o.id == id && o.active)?;
        record.active = false;
        record.exit_time = Some(exit_time);
        self.spot.occupied = false;
        Some(record.clone())
    }
}

type SharedSlot = Arc<Mutex<SpotSlot>>;

/// Memory-backed spot store and occupancy ledger.
#[derive(Debug, Default)]
pub struct MemoryStore {
    spots: RwLock<BTreeMap<SpotNumber, SharedSlot>>,
    next_occupancy_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored spot row and its full ledger, for inspection.
    pub async fn snapshot(&self, number: SpotNumber) -> Option<(Spot, Vec<Occupancy>)> {
        let slot = self.slot(number).await?;
        let guard = slot.lock().await;
        Some((guard.spot.clone(), guard.ledger.clone()))
    }

    async fn slot(&self, number: SpotNumber) -> Option<SharedSlot> {
        self.spots.read().await.get(&number).cloned()
    }

    /// All slots in spot-number order, without holding the map lock.
    async fn slots(&self) -> Vec<SharedSlot> {
        self.spots.read().await.values().cloned().collect()
    }

    fn next_id(&self) -> DbId {
        self.next_occupancy_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl ParkingStore for MemoryStore {
    async fn ping(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn seed_spots(&self, spots: &[NewSpot]) -> Result<usize, CoreError> {
        let mut map = self.spots.write().await;
        if !map.is_empty() {
            return Ok(0);
        }
        for new in spots {
            let spot = Spot {
                id: DbId::from(new.number),
                number: new.number,
                side: new.side,
                occupied: false,
                link_token: new.link_token.clone(),
            };
            let slot = SpotSlot {
                spot,
                ledger: Vec::new(),
            };
            map.insert(new.number, Arc::new(Mutex::new(slot)));
        }
        Ok(map.len())
    }

    async fn list_spots(&self) -> Result<Vec<SpotView>, CoreError> {
        let mut views = Vec::new();
        for slot in self.slots().await {
            views.push(slot.lock().await.view());
        }
        Ok(views)
    }

    async fn find_spot(&self, number: SpotNumber) -> Result<Option<SpotView>, CoreError> {
        match self.slot(number).await {
            Some(slot) => Ok(Some(slot.lock().await.view())),
            None => Ok(None),
        }
    }

    async fn lot_status(&self) -> Result<LotStatus, CoreError> {
        let slots = self.slots().await;
        let mut occupied = 0;
        for slot in &slots {
            if slot.lock().await.spot.occupied {
                occupied += 1;
            }
        }
        Ok(LotStatus::from_counts(slots.len() as i64, occupied))
    }

    async fn history(&self, limit: i64) -> Result<Vec<Occupancy>, CoreError> {
        let mut rows = Vec::new();
        for slot in self.slots().await {
            rows.extend(slot.lock().await.ledger.iter().cloned());
        }
        rows.sort_by(|a, b| b.entry_time.cmp(&a.entry_time).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn check_in(
        &self,
        number: SpotNumber,
        occupancy: NewOccupancy,
    ) -> Result<Occupancy, CoreError> {
        let slot = self
            .slot(number)
            .await
            .ok_or_else(|| CoreError::spot_not_found(number))?;
        let mut guard = slot.lock().await;
        rules::ensure_can_check_in(number, Some(&guard.spot))?;

        let record = Occupancy {
            id: self.next_id(),
            spot_id: guard.spot.id,
            spot_number: number,
            occupant_name: occupancy.occupant_name,
            entry_time: occupancy.entry_time,
            exit_time: None,
            active: true,
            pin: Some(occupancy.pin),
        };
        guard.ledger.push(record.clone());
        guard.spot.occupied = true;
        Ok(record)
    }

    async fn check_out(
        &self,
        number: SpotNumber,
        credentials: CheckOutCredentials<'_>,
        exit_time: Timestamp,
    ) -> Result<Occupancy, CoreError> {
        let slot = self
            .slot(number)
            .await
            .ok_or_else(|| CoreError::spot_not_found(number))?;
        let mut guard = slot.lock().await;

        let id = rules::ensure_can_check_out(
            number,
            Some(&guard.spot),
            guard.active(),
            credentials.occupant_name,
            credentials.pin,
        )?
        .id;

        guard.close(id, exit_time).ok_or_else(|| {
            CoreError::Internal(format!("Occupancy {id} vanished while spot {number} was locked"))
        })
    }

    async fn expire_before(
        &self,
        cutoff: Timestamp,
        exit_time: Timestamp,
    ) -> Result<Vec<Occupancy>, CoreError> {
        let mut closed = Vec::new();
        for slot in self.slots().await {
            let mut guard = slot.lock().await;
            let stale = guard
                .active()
                .filter(|o| o.entry_time < cutoff)
                .map(|o| o.id);
            if let Some(record) = stale.and_then(|id| guard.close(id, exit_time)) {
                closed.push(record);
            }
        }
        Ok(closed)
    }
}
