//! Check-in / check-out rules.
//!
//! Every store implementation evaluates these while it holds the spot's
//! lock, so the precondition order is identical regardless of backend.

use rand::Rng;

use crate::error::CoreError;
use crate::spot::{Occupancy, Spot};
use crate::types::SpotNumber;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of the occupant name (characters, after trimming).
pub const MAX_OCCUPANT_NAME_LENGTH: usize = 100;

/// Smallest PIN handed out at check-in.
pub const PIN_MIN: u16 = 1000;

/// Largest PIN handed out at check-in.
pub const PIN_MAX: u16 = 9999;

pub const MSG_CHECKED_IN: &str = "Check-in completed";
pub const MSG_CHECKED_OUT: &str = "Check-out completed";
pub const MSG_ALREADY_OCCUPIED: &str = "Spot is already occupied";
pub const MSG_ALREADY_FREE: &str = "Spot is already free";
pub const MSG_NO_ACTIVE_OCCUPANCY: &str = "No active occupancy found for this spot";
pub const MSG_NAME_MISMATCH: &str = "Name does not match the check-in";
pub const MSG_PIN_INCORRECT: &str = "Incorrect PIN";

// ---------------------------------------------------------------------------
// Occupant name / PIN
// ---------------------------------------------------------------------------

/// Validate and normalize an occupant name.
///
/// Returns the trimmed name. Empty or over-long names are rejected.
pub fn validate_occupant_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Occupant name is required".into()));
    }
    let len = trimmed.chars().count();
    if len > MAX_OCCUPANT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Occupant name exceeds maximum length of {MAX_OCCUPANT_NAME_LENGTH} characters (got {len})"
        )));
    }
    Ok(trimmed.to_string())
}

/// Generate a random four-digit PIN in `PIN_MIN..=PIN_MAX`.
pub fn generate_pin() -> String {
    let value = rand::rng().random_range(PIN_MIN..=PIN_MAX);
    value.to_string()
}

/// Case-insensitive name comparison used at checkout.
pub fn names_match(recorded: &str, supplied: &str) -> bool {
    recorded.trim().to_lowercase() == supplied.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Check-in preconditions, first failure wins:
///
/// 1. the spot exists (NotFound)
/// 2. the spot is free (Conflict)
pub fn ensure_can_check_in(number: SpotNumber, spot: Option<&Spot>) -> Result<&Spot, CoreError> {
    let spot = spot.ok_or_else(|| CoreError::spot_not_found(number))?;
    if spot.occupied {
        return Err(CoreError::Conflict(MSG_ALREADY_OCCUPIED.into()));
    }
    Ok(spot)
}

/// Check-out preconditions, first failure wins:
///
/// 1. the spot exists (NotFound)
/// 2. the spot is occupied (Conflict)
/// 3. an active occupancy exists (Conflict)
/// 4. the name matches, ignoring case (Unauthorized)
/// 5. the PIN matches when the occupancy has one (Unauthorized)
///
/// Returns the active occupancy to close.
pub fn ensure_can_check_out<'a>(
    number: SpotNumber,
    spot: Option<&Spot>,
    active: Option<&'a Occupancy>,
    occupant_name: &str,
    pin: Option<&str>,
) -> Result<&'a Occupancy, CoreError> {
    let spot = spot.ok_or_else(|| CoreError::spot_not_found(number))?;
    if !spot.occupied {
        return Err(CoreError::Conflict(MSG_ALREADY_FREE.into()));
    }
    let active = active.ok_or_else(|| CoreError::Conflict(MSG_NO_ACTIVE_OCCUPANCY.into()))?;

    if !names_match(&active.occupant_name, occupant_name) {
        return Err(CoreError::Unauthorized(MSG_NAME_MISMATCH.into()));
    }

    if active.has_pin() && active.pin.as_deref() != pin {
        return Err(CoreError::Unauthorized(MSG_PIN_INCORRECT.into()));
    }

    Ok(active)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
