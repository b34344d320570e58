//! Periodic release of stale occupancies.
//!
//! Every `period` the sweeper asks the parking service to close occupancies
//! older than the configured timeout. The first sweep runs immediately on
//! start. A failed sweep is logged and the next tick tries again.

use std::sync::Arc;
use std::time::Duration;

use parking_core::ParkingService;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Shortest period the loop will tick at.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(service: Arc<ParkingService>, period: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = period.as_secs(),
        timeout_secs = service.config().occupancy_timeout.as_secs(),
        "Timeout sweeper started"
    );

    // `interval` panics on a zero period.
    let mut interval = tokio::time::interval(period.max(MIN_PERIOD));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Timeout sweeper stopping");
                break;
            }
            _ = interval.tick() => sweep_once(&service).await,
        }
    }
}

/// One sweep, isolated in its own task so a panic cannot end the loop.
async fn sweep_once(service: &Arc<ParkingService>) {
    let service = Arc::clone(service);
    match tokio::spawn(async move { service.expire_stale().await }).await {
        Ok(Ok(freed)) => {
            if freed > 0 {
                tracing::info!(freed, "Timeout sweep: released stale occupancies");
            } else {
                tracing::debug!("Timeout sweep: nothing to release");
            }
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Timeout sweep failed");
        }
        Err(e) => {
            tracing::error!(error = %e, "Timeout sweep task aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use parking_core::error::CoreError;
    use parking_core::lot::ParkingConfig;
    use parking_core::memory::MemoryStore;
    use parking_core::notify::NoopNotifier;
    use parking_core::spot::{LotStatus, NewSpot, Occupancy, SpotView};
    use parking_core::store::{CheckOutCredentials, NewOccupancy, ParkingStore};
    use parking_core::types::{SpotNumber, Timestamp};

    use super::*;

    /// Store whose first expiry call fails and whose second panics.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        expiry_calls: AtomicUsize,
    }

    #[async_trait]
    impl ParkingStore for FlakyStore {
        async fn ping(&self) -> Result<(), CoreError> {
            self.inner.ping().await
        }

        async fn seed_spots(&self, spots: &[NewSpot]) -> Result<usize, CoreError> {
            self.inner.seed_spots(spots).await
        }

        async fn list_spots(&self) -> Result<Vec<SpotView>, CoreError> {
            self.inner.list_spots().await
        }

        async fn find_spot(&self, number: SpotNumber) -> Result<Option<SpotView>, CoreError> {
            self.inner.find_spot(number).await
        }

        async fn lot_status(&self) -> Result<LotStatus, CoreError> {
            self.inner.lot_status().await
        }

        async fn history(&self, limit: i64) -> Result<Vec<Occupancy>, CoreError> {
            self.inner.history(limit).await
        }

        async fn check_in(
            &self,
            number: SpotNumber,
            occupancy: NewOccupancy,
        ) -> Result<Occupancy, CoreError> {
            self.inner.check_in(number, occupancy).await
        }

        async fn check_out(
            &self,
            number: SpotNumber,
            credentials: CheckOutCredentials<'_>,
            exit_time: Timestamp,
        ) -> Result<Occupancy, CoreError> {
            self.inner.check_out(number, credentials, exit_time).await
        }

        async fn expire_before(
            &self,
            cutoff: Timestamp,
            exit_time: Timestamp,
        ) -> Result<Vec<Occupancy>, CoreError> {
            match self.expiry_calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(CoreError::Internal("connection reset".into())),
                1 => panic!("sweep blew up"),
                _ => self.inner.expire_before(cutoff, exit_time).await,
            }
        }
    }

    async fn service() -> Arc<ParkingService> {
        let service = ParkingService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NoopNotifier),
            ParkingConfig::default(),
        );
        service.initialize().await.unwrap();
        Arc::new(service)
    }

    #[tokio::test]
    async fn first_tick_releases_stale_spots() {
        let service = service().await;
        let stale = Utc::now() - chrono::Duration::hours(13);
        service.check_in_at(5, "Ana", stale).await.unwrap();
        service.check_in(6, "Bia").await.unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            Arc::clone(&service),
            Duration::from_secs(3600),
            cancel.clone(),
        ));

        let mut released = false;
        for _ in 0..50 {
            if !service.get_spot(5).await.unwrap().unwrap().occupied {
                released = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        task.await.unwrap();

        assert!(released, "stale spot was not released");
        assert!(service.get_spot(6).await.unwrap().unwrap().occupied);
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(
            Duration::from_secs(1),
            run(service().await, Duration::from_secs(60), cancel),
        )
        .await
        .expect("sweeper did not stop");
    }

    #[tokio::test]
    async fn loop_survives_failed_and_panicking_sweeps() {
        let store = Arc::new(FlakyStore::default());
        let service = Arc::new(ParkingService::new(
            store.clone(),
            Arc::new(NoopNotifier),
            ParkingConfig::default(),
        ));
        service.initialize().await.unwrap();
        let stale = Utc::now() - chrono::Duration::hours(13);
        service.check_in_at(5, "Ana", stale).await.unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            Arc::clone(&service),
            Duration::from_secs(1),
            cancel.clone(),
        ));

        let mut released = false;
        for _ in 0..100 {
            if !service.get_spot(5).await.unwrap().unwrap().occupied {
                released = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        cancel.cancel();
        task.await.expect("sweeper loop must not die");

        assert!(store.expiry_calls.load(Ordering::SeqCst) >= 3);
        assert!(released, "third sweep should release the stale spot");
    }

    #[tokio::test]
    async fn zero_period_does_not_kill_the_loop() {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(service().await, Duration::ZERO, cancel.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        task.await.expect("sweeper loop must not panic");
    }
}
