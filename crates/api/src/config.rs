use std::str::FromStr;
use std::time::Duration;

use parking_core::lot::{ParkingConfig, DEFAULT_TOTAL_SPOTS};

/// Default period of the stale-occupancy sweep.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Default occupancy timeout, in hours.
pub const DEFAULT_OCCUPANCY_TIMEOUT_HOURS: u64 = 12;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`
    /// (`*` allows any origin).
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. When unset the server keeps state in memory.
    pub database_url: Option<String>,
    /// Front-end base URL used in QR deep-links.
    pub public_base_url: String,
    /// Period of the timeout sweeper in seconds (default: `300`).
    pub sweep_interval_secs: u64,
    /// Lot layout and occupancy timeout.
    pub parking: ParkingConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                  |
    /// |---------------------------|--------------------------|
    /// | `HOST`                    | `0.0.0.0`                |
    /// | `PORT`                    | `3000`                   |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                     |
    /// | `DATABASE_URL`            | unset (in-memory)        |
    /// | `PUBLIC_BASE_URL`         | `http://localhost:5173`  |
    /// | `SWEEP_INTERVAL_SECS`     | `300`                    |
    /// | `PARKING_TOTAL_SPOTS`     | `50`                     |
    /// | `PARKING_SIDE_SPLIT`      | half of the total        |
    /// | `OCCUPANCY_TIMEOUT_HOURS` | `12`                     |
    ///
    /// Panics on unparsable or invalid values (see [`ServerConfig::validate`])
    /// so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", 30);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let public_base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".into());

        let sweep_interval_secs: u64 = parse_env("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);

        let total_spots = parse_env("PARKING_TOTAL_SPOTS", DEFAULT_TOTAL_SPOTS);
        let side_split = parse_env("PARKING_SIDE_SPLIT", total_spots / 2);
        let timeout_hours: u64 =
            parse_env("OCCUPANCY_TIMEOUT_HOURS", DEFAULT_OCCUPANCY_TIMEOUT_HOURS);

        let occupancy_timeout = hours(timeout_hours)
            .unwrap_or_else(|| panic!("OCCUPANCY_TIMEOUT_HOURS is too large: {timeout_hours}"));

        let parking = ParkingConfig {
            total_spots,
            side_split,
            occupancy_timeout,
        };

        let config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            public_base_url,
            sweep_interval_secs,
            parking,
        };

        if let Err(e) = config.validate() {
            panic!("Invalid configuration: {e}");
        }
        config
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_secs == 0 {
            return Err("SWEEP_INTERVAL_SECS must be greater than zero".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT_SECS must be greater than zero".into());
        }
        if self.parking.occupancy_timeout.is_zero() {
            return Err("OCCUPANCY_TIMEOUT_HOURS must be greater than zero".into());
        }
        self.parking.validate().map_err(|e| e.to_string())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// `hours` as a [`Duration`], or `None` on overflow.
fn hours(hours: u64) -> Option<Duration> {
    hours.checked_mul(3600).map(Duration::from_secs)
}

/// Read `key` and parse it, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
