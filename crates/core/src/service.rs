//! The parking service: check-in, check-out, reads and the expiry sweep.
//!
//! [`ParkingService`] owns the business flow over an injected
//! [`ParkingStore`] and [`ParkingNotifier`]. Atomicity and per-spot
//! serialization are delegated to the store; notification happens only
//! after the store has committed.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::lot::{ParkingConfig, HISTORY_LIMIT};
use crate::notify::{ParkingNotifier, SpotChange};
use crate::qr;
use crate::rules;
use crate::spot::{LotStatus, Occupancy, SpotView};
use crate::store::{CheckOutCredentials, NewOccupancy, ParkingStore};
use crate::types::{SpotNumber, Timestamp};

/// Successful check-in.
#[derive(Debug, Clone)]
pub struct CheckInReceipt {
    pub message: &'static str,
    /// The occupant's checkout credential. Shown once, never listed again.
    pub pin: String,
    pub occupancy: Occupancy,
}

/// Successful check-out.
#[derive(Debug, Clone)]
pub struct CheckOutReceipt {
    pub message: &'static str,
    pub occupancy: Occupancy,
}

pub struct ParkingService {
    store: Arc<dyn ParkingStore>,
    notifier: Arc<dyn ParkingNotifier>,
    config: ParkingConfig,
    /// Held across the status read and its publication, so statuses go
    /// out in the order they were read.
    status_gate: Mutex<()>,
}

impl ParkingService {
    pub fn new(
        store: Arc<dyn ParkingStore>,
        notifier: Arc<dyn ParkingNotifier>,
        config: ParkingConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
            status_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ParkingConfig {
        &self.config
    }

    /// Whether the backing store answers.
    pub async fn store_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    /// Create the lot's spots on first start. Safe to call on every start.
    ///
    /// Returns the number of spots created.
    pub async fn initialize(&self) -> Result<usize, CoreError> {
        self.config.validate()?;
        let created = self.store.seed_spots(&self.config.plan_spots()).await?;
        if created > 0 {
            tracing::info!(created, "Parking spots initialized");
        } else {
            tracing::debug!("Parking spots already present, skipping initialization");
        }
        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn list_spots(&self) -> Result<Vec<SpotView>, CoreError> {
        self.store.list_spots().await
    }

    pub async fn get_spot(&self, number: SpotNumber) -> Result<Option<SpotView>, CoreError> {
        self.store.find_spot(number).await
    }

    pub async fn lot_status(&self) -> Result<LotStatus, CoreError> {
        self.store.lot_status().await
    }

    /// The latest [`HISTORY_LIMIT`] occupancies, newest entry first.
    pub async fn history(&self) -> Result<Vec<Occupancy>, CoreError> {
        self.store.history(HISTORY_LIMIT).await
    }

    /// PNG QR code pointing at the spot's check-in deep-link.
    pub async fn qr_code_png(
        &self,
        number: SpotNumber,
        base_url: &str,
    ) -> Result<Vec<u8>, CoreError> {
        if self.store.find_spot(number).await?.is_none() {
            return Err(CoreError::spot_not_found(number));
        }
        qr::render_png(&qr::checkin_link(base_url, number))
    }

    // -----------------------------------------------------------------------
    // Check-in / check-out
    // -----------------------------------------------------------------------

    pub async fn check_in(
        &self,
        number: SpotNumber,
        occupant_name: &str,
    ) -> Result<CheckInReceipt, CoreError> {
        self.check_in_at(number, occupant_name, Utc::now()).await
    }

    /// Check in with an explicit entry time.
    pub async fn check_in_at(
        &self,
        number: SpotNumber,
        occupant_name: &str,
        entry_time: Timestamp,
    ) -> Result<CheckInReceipt, CoreError> {
        let occupant_name = rules::validate_occupant_name(occupant_name)?;
        let pin = rules::generate_pin();

        let new = NewOccupancy {
            occupant_name,
            pin: pin.clone(),
            entry_time,
        };
        let occupancy = self.store.check_in(number, new).await.inspect_err(|e| {
            if e.is_rejection() {
                tracing::debug!(spot_number = number, error = %e, "Check-in rejected");
            }
        })?;

        tracing::info!(
            spot_number = number,
            occupant = %occupancy.occupant_name,
            "Check-in"
        );

        self.notifier.spot_changed(SpotChange::occupied_by(&occupancy));
        self.publish_status().await;

        Ok(CheckInReceipt {
            message: rules::MSG_CHECKED_IN,
            pin,
            occupancy,
        })
    }

    pub async fn check_out(
        &self,
        number: SpotNumber,
        occupant_name: &str,
        pin: Option<&str>,
    ) -> Result<CheckOutReceipt, CoreError> {
        self.check_out_at(number, occupant_name, pin, Utc::now()).await
    }

    /// Check out with an explicit exit time.
    pub async fn check_out_at(
        &self,
        number: SpotNumber,
        occupant_name: &str,
        pin: Option<&str>,
        exit_time: Timestamp,
    ) -> Result<CheckOutReceipt, CoreError> {
        let credentials = CheckOutCredentials { occupant_name, pin };
        let occupancy = self
            .store
            .check_out(number, credentials, exit_time)
            .await
            .inspect_err(|e| {
                if e.is_rejection() {
                    tracing::debug!(spot_number = number, error = %e, "Check-out rejected");
                }
            })?;

        tracing::info!(
            spot_number = number,
            occupant = %occupancy.occupant_name,
            "Check-out"
        );

        self.notifier.spot_changed(SpotChange::freed(number));
        self.publish_status().await;

        Ok(CheckOutReceipt {
            message: rules::MSG_CHECKED_OUT,
            occupancy,
        })
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    /// Release every occupancy older than the configured timeout.
    ///
    /// Returns the number of spots freed.
    pub async fn expire_stale(&self) -> Result<usize, CoreError> {
        self.expire_stale_at(Utc::now()).await
    }

    /// Run the expiry sweep as if the current time were `now`.
    pub async fn expire_stale_at(&self, now: Timestamp) -> Result<usize, CoreError> {
        let timeout = chrono::Duration::from_std(self.config.occupancy_timeout)
            .map_err(|e| CoreError::Internal(format!("Occupancy timeout out of range: {e}")))?;
        let cutoff = now - timeout;

        let expired = self.store.expire_before(cutoff, now).await?;
        for occupancy in &expired {
            tracing::warn!(
                spot_number = occupancy.spot_number,
                occupant = %occupancy.occupant_name,
                entry_time = %occupancy.entry_time,
                "Spot released automatically (timeout)"
            );
            self.notifier
                .spot_changed(SpotChange::freed(occupancy.spot_number));
        }
        if !expired.is_empty() {
            self.publish_status().await;
        }

        Ok(expired.len())
    }

    /// Push the current lot status. Failures are logged, never returned.
    ///
    /// Every caller reads after its own commit, so the last status published
    /// reflects the latest committed change.
    async fn publish_status(&self) {
        let _gate = self.status_gate.lock().await;
        match self.store.lot_status().await {
            Ok(status) => self.notifier.status_changed(status.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read lot status for broadcast");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
