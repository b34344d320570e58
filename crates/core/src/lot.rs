//! Lot layout and parking rules configuration.

use std::time::Duration;

use uuid::Uuid;

use crate::error::CoreError;
use crate::spot::{NewSpot, Side};
use crate::types::SpotNumber;

/// Default number of spots in the lot.
pub const DEFAULT_TOTAL_SPOTS: SpotNumber = 50;

/// Default time after which an active occupancy is released automatically.
pub const DEFAULT_OCCUPANCY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

/// Number of ledger rows returned by the history query.
pub const HISTORY_LIMIT: i64 = 100;

/// Static lot configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingConfig {
    /// Total number of spots, numbered `1..=total_spots`.
    pub total_spots: SpotNumber,
    /// Spots numbered `<= side_split` are on the left, the rest on the right.
    pub side_split: SpotNumber,
    /// Age after which an active occupancy is expired by the sweeper.
    pub occupancy_timeout: Duration,
}

impl ParkingConfig {
    /// Configuration for a lot of `total_spots` split evenly in two.
    pub fn with_total(total_spots: SpotNumber) -> Self {
        Self {
            total_spots,
            side_split: total_spots / 2,
            occupancy_timeout: DEFAULT_OCCUPANCY_TIMEOUT,
        }
    }

    /// Reject layouts that cannot be built.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.total_spots <= 0 {
            return Err(CoreError::Validation(format!(
                "Total spot count must be positive (got {})",
                self.total_spots
            )));
        }
        if self.side_split < 0 || self.side_split > self.total_spots {
            return Err(CoreError::Validation(format!(
                "Side split {} must be between 0 and {}",
                self.side_split, self.total_spots
            )));
        }
        Ok(())
    }

    /// The spots to create on first start, each with a fresh link token.
    pub fn plan_spots(&self) -> Vec<NewSpot> {
        (1..=self.total_spots)
            .map(|number| NewSpot {
                number,
                side: Side::for_number(number, self.side_split),
                link_token: new_link_token(),
            })
            .collect()
    }
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self::with_total(DEFAULT_TOTAL_SPOTS)
    }
}

/// Generate an opaque 32-character hex token.
pub fn new_link_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn default_lot_has_fifty_spots_split_in_half() {
        let config = ParkingConfig::default();
        assert_eq!(config.total_spots, 50);
        assert_eq!(config.side_split, 25);
        assert_eq!(config.occupancy_timeout, Duration::from_secs(43_200));
    }

    #[test]
    fn plan_numbers_spots_contiguously_with_unique_tokens() {
        let spots = ParkingConfig::default().plan_spots();
        assert_eq!(spots.len(), 50);
        assert_eq!(spots.first().map(|s| s.number), Some(1));
        assert_eq!(spots.last().map(|s| s.number), Some(50));

        let tokens: HashSet<_> = spots.iter().map(|s| s.link_token.as_str()).collect();
        assert_eq!(tokens.len(), 50);
        assert!(spots.iter().all(|s| s.link_token.len() == 32));

        let left = spots.iter().filter(|s| s.side == Side::Left).count();
        assert_eq!(left, 25);
    }

    #[test]
    fn validate_rejects_empty_lot_and_bad_split() {
        assert!(ParkingConfig::with_total(0).validate().is_err());

        let mut config = ParkingConfig::with_total(10);
        config.side_split = 11;
        assert!(config.validate().is_err());

        config.side_split = 10;
        assert!(config.validate().is_ok());
    }
}
