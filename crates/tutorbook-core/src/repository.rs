//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The booking service is generic
//! over these traits, so it carries no dependency on the storage crate.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::BookingResult;
use crate::models::participant::{CreateParticipant, Participant};
use crate::models::slot::{CreateSlot, Slot, SlotState};

/// Filter options for slot listings. All fields are optional and
/// combine with AND.
#[derive(Debug, Clone, Default)]
pub struct SlotFilter {
    pub state: Option<SlotState>,
    pub requester_id: Option<Uuid>,
    /// Earliest `start` to include.
    pub from: Option<DateTime<Utc>>,
    /// Latest `start` to include.
    pub until: Option<DateTime<Utc>>,
}

pub trait ParticipantRepository: Send + Sync {
    /// Create-if-absent, keyed on the external chat identifier. Racing
    /// creators for the same identifier all observe the same record.
    fn get_or_create(
        &self,
        input: CreateParticipant,
    ) -> impl Future<Output = BookingResult<Participant>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = BookingResult<Participant>> + Send;

    fn get_by_external_id(
        &self,
        external_id: i64,
    ) -> impl Future<Output = BookingResult<Participant>> + Send;
}

pub trait SlotRepository: Send + Sync {
    /// Persist a new slot in the `Free` state.
    ///
    /// Rejects an interval that intersects an existing `[start, end)`
    /// of the same owner with `Overlap`; the check and the insert run
    /// in one transaction.
    fn create(&self, input: CreateSlot) -> impl Future<Output = BookingResult<Slot>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = BookingResult<Slot>> + Send;

    /// Slots of one owner matching `filter`, ordered by `start`.
    fn list(
        &self,
        owner_id: Uuid,
        filter: SlotFilter,
    ) -> impl Future<Output = BookingResult<Vec<Slot>>> + Send;

    /// Distinct calendar dates in `[from, until]` with at least one
    /// `Free` slot for the owner.
    fn free_dates(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> impl Future<Output = BookingResult<BTreeSet<NaiveDate>>> + Send;

    /// Atomically move a slot to `next_state`/`next_requester`,
    /// provided it still carries the expected state and requester.
    /// Returns `None` when the precondition no longer holds; the
    /// caller reloads and re-decides.
    fn update_state(
        &self,
        id: Uuid,
        expected_state: SlotState,
        expected_requester: Option<Uuid>,
        next_state: SlotState,
        next_requester: Option<Uuid>,
    ) -> impl Future<Output = BookingResult<Option<Slot>>> + Send;

    /// Remove a slot regardless of its state.
    fn delete(&self, id: Uuid) -> impl Future<Output = BookingResult<()>> + Send;
}
