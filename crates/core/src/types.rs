/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Spot numbers are small positive integers (`1..=N`).
pub type SpotNumber = i32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
