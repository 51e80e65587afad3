//! Participant domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person known to the chat transport.
///
/// Created lazily on first contact and immutable afterwards. Whether a
/// participant is the scheduling authority is decided by configuration
/// in the booking layer, not by a stored role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    /// Opaque numeric identifier assigned by the chat transport.
    pub external_id: i64,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateParticipant {
    pub external_id: i64,
    pub display_name: String,
}
