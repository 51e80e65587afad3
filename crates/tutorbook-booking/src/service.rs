//! Booking service — slot lifecycle orchestration.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use tutorbook_core::error::{BookingError, BookingResult};
use tutorbook_core::machine::{self, Actor, BookingAction, NoticeKind, NoticeTarget, Role};
use tutorbook_core::models::slot::{CreateSlot, Slot};
use tutorbook_core::repository::{ParticipantRepository, SlotFilter, SlotRepository};
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::notification::NotificationIntent;

/// Booking coordinator.
///
/// Generic over repository implementations so that the coordination
/// layer has no dependency on the database crate. All slot mutation in
/// the system goes through this service.
pub struct BookingService<S: SlotRepository, P: ParticipantRepository> {
    slots: S,
    participants: P,
    config: BookingConfig,
}

impl<S: SlotRepository, P: ParticipantRepository> BookingService<S, P> {
    pub fn new(slots: S, participants: P, config: BookingConfig) -> Self {
        Self {
            slots,
            participants,
            config,
        }
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Apply one lifecycle action to a slot and return the persisted
    /// slot together with the notification intents it produced.
    ///
    /// The load, the pure decision and the conditional write repeat
    /// when a concurrent transition invalidates the loaded snapshot;
    /// after the configured number of lost races the caller gets
    /// `Conflict`. A rejected action changes nothing.
    pub async fn apply(
        &self,
        actor_id: i64,
        slot_id: Uuid,
        action: BookingAction,
    ) -> BookingResult<(Slot, Vec<NotificationIntent>)> {
        // 1. Resolve the acting participant; the role comes from
        //    configuration, not storage.
        let participant = self.participants.get_by_external_id(actor_id).await?;
        let actor = Actor {
            participant_id: participant.id,
            role: self.role_of(actor_id),
        };

        let mut lost_races = 0;
        loop {
            // 2. Load the latest committed snapshot.
            let slot = self.slots.get_by_id(slot_id).await?;

            // 3. Pure decision; every guard lives in the machine.
            let transition = machine::transition(&slot, actor, action)?;

            // 4. Persist against exactly the snapshot the decision
            //    used.
            let updated = self
                .slots
                .update_state(
                    slot.id,
                    slot.state,
                    slot.requester_id,
                    transition.next_state,
                    transition.next_requester,
                )
                .await?;

            match updated {
                Some(persisted) => {
                    let intents = self.intents_for(&transition.notices, &persisted).await;
                    return Ok((persisted, intents));
                }
                None => {
                    lost_races += 1;
                    if lost_races > self.config.max_transition_retries {
                        return Err(BookingError::Conflict);
                    }
                    debug!(
                        slot_id = %slot_id,
                        action = action.as_str(),
                        lost_races,
                        "transition lost a concurrent update, re-deciding"
                    );
                }
            }
        }
    }

    /// Publish a new bookable window. Authority only.
    pub async fn create_slot(
        &self,
        actor_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        subject: Option<String>,
    ) -> BookingResult<Slot> {
        if self.role_of(actor_id) != Role::Authority {
            return Err(BookingError::Forbidden);
        }
        if end <= start {
            return Err(BookingError::InvalidRange);
        }

        let owner = self.participants.get_by_external_id(actor_id).await?;
        self.slots
            .create(CreateSlot {
                owner_id: owner.id,
                start,
                end,
                subject,
            })
            .await
    }

    /// Remove a slot regardless of its state. Authority only; a
    /// displaced requester gets a cancellation intent.
    pub async fn delete_slot(
        &self,
        actor_id: i64,
        slot_id: Uuid,
    ) -> BookingResult<Vec<NotificationIntent>> {
        if self.role_of(actor_id) != Role::Authority {
            return Err(BookingError::Forbidden);
        }

        let slot = self.slots.get_by_id(slot_id).await?;
        let notices = match slot.requester_id {
            Some(requester) => vec![(NoticeTarget::Requester(requester), NoticeKind::SlotDeleted)],
            None => Vec::new(),
        };
        let intents = self.intents_for(&notices, &slot).await;

        self.slots.delete(slot.id).await?;
        Ok(intents)
    }

    /// Slots of one owner matching `filter`, ordered by start.
    pub async fn list_slots(&self, owner_id: Uuid, filter: SlotFilter) -> BookingResult<Vec<Slot>> {
        self.slots.list(owner_id, filter).await
    }

    /// The acting requester's pending and confirmed reservations with
    /// the configured authority.
    pub async fn my_lessons(&self, actor_id: i64) -> BookingResult<Vec<Slot>> {
        let actor = self.participants.get_by_external_id(actor_id).await?;
        let authority = self
            .participants
            .get_by_external_id(self.config.authority_id)
            .await?;

        self.slots
            .list(
                authority.id,
                SlotFilter {
                    requester_id: Some(actor.id),
                    ..Default::default()
                },
            )
            .await
    }

    fn role_of(&self, actor_id: i64) -> Role {
        if actor_id == self.config.authority_id {
            Role::Authority
        } else {
            Role::Requester
        }
    }

    /// Materialize notices into deliverable intents. Never fails:
    /// a notice whose recipient cannot be resolved is dropped, since
    /// delivery is best-effort and the transition is already
    /// committed.
    async fn intents_for(
        &self,
        notices: &[(NoticeTarget, NoticeKind)],
        slot: &Slot,
    ) -> Vec<NotificationIntent> {
        let mut intents = Vec::with_capacity(notices.len());
        for (target, kind) in notices {
            let recipient = match target {
                NoticeTarget::Authority => Some(self.config.authority_id),
                NoticeTarget::Requester(id) => match self.participants.get_by_id(*id).await {
                    Ok(p) => Some(p.external_id),
                    Err(e) => {
                        warn!(
                            participant_id = %id,
                            error = %e,
                            "dropping notification for unresolvable participant"
                        );
                        None
                    }
                },
            };
            if let Some(recipient) = recipient {
                intents.push(NotificationIntent {
                    recipient,
                    kind: *kind,
                    slot: slot.clone(),
                });
            }
        }
        intents
    }
}
