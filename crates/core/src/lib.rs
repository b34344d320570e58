//! Parking lot domain: spots, the occupancy ledger, and the rules that
//! govern check-in, check-out and timeout expiry.
//!
//! Storage and notification are injected through the [`store::ParkingStore`]
//! and [`notify::ParkingNotifier`] traits so the service runs unchanged over
//! PostgreSQL (see `parking-db`) or the in-memory [`memory::MemoryStore`].

pub mod error;
pub mod lot;
pub mod memory;
pub mod notify;
pub mod qr;
pub mod rules;
pub mod service;
pub mod spot;
pub mod store;
pub mod types;

pub use service::{CheckInReceipt, CheckOutReceipt, ParkingService};
