//! Error types for the booking engine.

use thiserror::Error;

/// Every rejection a caller can receive from the booking engine.
///
/// All variants except `Database` are expected, recoverable outcomes
/// for the dispatch layer to translate into user-facing messages.
/// `Database` is the infrastructure fault class: the operation aborted
/// with no partial state change.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Slot is no longer free")]
    AlreadyTaken,

    #[error("Action {action} is not valid for a {state} slot")]
    InvalidState { action: String, state: String },

    #[error("Actor does not hold this reservation")]
    NotOwner,

    #[error("Actor is not permitted to perform this action")]
    Forbidden,

    #[error("Slot end must be strictly after its start")]
    InvalidRange,

    #[error("Slot overlaps an existing slot for this owner")]
    Overlap,

    #[error("Concurrent updates kept invalidating the transition")]
    Conflict,

    #[error("Database error: {0}")]
    Database(String),
}

pub type BookingResult<T> = Result<T, BookingError>;
