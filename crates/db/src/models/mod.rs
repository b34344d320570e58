//! Row models for the `spots` and `occupancies` tables.

pub mod occupancy;
pub mod spot;
