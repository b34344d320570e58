use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing spot.
    pub fn spot_not_found(number: crate::types::SpotNumber) -> Self {
        CoreError::NotFound {
            entity: "Spot",
            id: DbId::from(number),
        }
    }

    /// `true` for the expected, caller-facing outcomes (everything except
    /// [`CoreError::Internal`]).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, CoreError::Internal(_))
    }
}
