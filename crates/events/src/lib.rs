//! Parking event bus.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, wired into the parking service as its
//!   [`ParkingNotifier`](parking_core::notify::ParkingNotifier).
//! - [`ParkingEvent`] — the envelope fanned out to viewers.

pub mod bus;

pub use bus::{EventBus, ParkingEvent};
