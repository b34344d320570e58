//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Reads take `&PgPool`; methods that must run inside the caller's
//! transaction take `&mut PgConnection`.

pub mod occupancy_repo;
pub mod spot_repo;

pub use occupancy_repo::OccupancyRepo;
pub use spot_repo::SpotRepo;
