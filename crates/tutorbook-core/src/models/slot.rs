//! Time-slot domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a bookable slot.
///
/// A single enumeration rather than a booked flag plus an optional
/// student reference: every transition precondition is one state check,
/// and "booked with nobody attached" cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Free,
    Requested,
    Confirmed,
}

/// A bookable time window published by the scheduling authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    /// The authority that published this slot; fixed at creation.
    pub owner_id: Uuid,
    pub start: DateTime<Utc>,
    /// Exclusive end of the window; strictly after `start`.
    pub end: DateTime<Utc>,
    /// Optional free-text lesson topic.
    pub subject: Option<String>,
    pub state: SlotState,
    /// The participant holding the reservation; `Some` iff the slot is
    /// not `Free`.
    pub requester_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// `requester_id` must be set exactly when the slot is not free.
    pub fn requester_consistent(&self) -> bool {
        (self.state == SlotState::Free) == self.requester_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlot {
    pub owner_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub subject: Option<String>,
}
