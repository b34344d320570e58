//! Translation of sqlx errors into domain errors.

use parking_core::error::CoreError;
use parking_core::rules::MSG_ALREADY_OCCUPIED;

/// Partial unique index allowing one active occupancy per spot.
pub const UQ_ACTIVE_OCCUPANCY: &str = "uq_occupancies_active_spot";

/// Map a sqlx error into a [`CoreError`].
///
/// - Unique violations (SQLSTATE 23505) on a `uq_`-prefixed constraint
///   become [`CoreError::Conflict`]: two writers raced for the same row.
/// - Everything else is an infrastructure failure ([`CoreError::Internal`]).
pub fn into_core(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint == UQ_ACTIVE_OCCUPANCY {
                return CoreError::Conflict(MSG_ALREADY_OCCUPIED.into());
            }
            if constraint.starts_with("uq_") {
                tracing::debug!(constraint, "Unique constraint rejected concurrent write");
                return CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ));
            }
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(format!("Database error: {err}"))
}
