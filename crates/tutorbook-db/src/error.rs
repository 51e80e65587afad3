//! Database-specific error types and conversions.

use tutorbook_core::error::BookingError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid stored record: {0}")]
    Corrupt(String),
}

impl From<DbError> for BookingError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => BookingError::NotFound { entity, id },
            other => BookingError::Database(other.to_string()),
        }
    }
}
