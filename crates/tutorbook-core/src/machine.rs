//! Pure transition logic for the slot lifecycle.
//!
//! Every guard of the booking workflow lives here. The machine performs
//! no I/O: it looks at a loaded slot, the acting participant and the
//! requested action, and either describes the transition to persist or
//! rejects it with a typed error. Orchestration (loading, persisting,
//! notification delivery) belongs to the booking service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::models::slot::{Slot, SlotState};

/// Role of the acting participant, resolved against configuration by
/// the booking service before the machine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authority,
    Requester,
}

/// The acting participant as the machine sees it.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub participant_id: Uuid,
    pub role: Role,
}

/// Requested change to a slot's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingAction {
    Request,
    Approve,
    Reject,
    Withdraw,
    CancelByAuthority,
    CancelByRequester,
}

impl BookingAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingAction::Request => "Request",
            BookingAction::Approve => "Approve",
            BookingAction::Reject => "Reject",
            BookingAction::Withdraw => "Withdraw",
            BookingAction::CancelByAuthority => "CancelByAuthority",
            BookingAction::CancelByRequester => "CancelByRequester",
        }
    }
}

/// Who must be told about an accepted change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTarget {
    Authority,
    /// The participant attached to the slot when the decision was made.
    Requester(Uuid),
}

/// What they must be told. Delivery is somebody else's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    NewRequest,
    Approved,
    Rejected,
    Withdrawn,
    CancelledByAuthority,
    CancelledByRequester,
    SlotDeleted,
}

/// An accepted transition: the fields to persist plus the notices the
/// booking service turns into notification intents.
#[derive(Debug, Clone)]
pub struct Transition {
    pub next_state: SlotState,
    pub next_requester: Option<Uuid>,
    pub notices: Vec<(NoticeTarget, NoticeKind)>,
}

fn invalid_state(action: BookingAction, state: SlotState) -> BookingError {
    BookingError::InvalidState {
        action: action.as_str().into(),
        state: format!("{state:?}"),
    }
}

/// Decide a lifecycle transition.
///
/// Guards, in order: the actor's role must fit the action, the slot
/// must be in the right state, and requester-only actions must come
/// from the participant currently holding the reservation.
pub fn transition(slot: &Slot, actor: Actor, action: BookingAction) -> BookingResult<Transition> {
    match action {
        BookingAction::Request => {
            if actor.role != Role::Requester {
                return Err(BookingError::Forbidden);
            }
            match slot.state {
                SlotState::Free => Ok(Transition {
                    next_state: SlotState::Requested,
                    next_requester: Some(actor.participant_id),
                    notices: vec![(NoticeTarget::Authority, NoticeKind::NewRequest)],
                }),
                SlotState::Requested | SlotState::Confirmed => Err(BookingError::AlreadyTaken),
            }
        }
        BookingAction::Approve | BookingAction::Reject => {
            if actor.role != Role::Authority {
                return Err(BookingError::Forbidden);
            }
            match (slot.state, slot.requester_id) {
                (SlotState::Requested, Some(requester)) => {
                    if action == BookingAction::Approve {
                        Ok(Transition {
                            next_state: SlotState::Confirmed,
                            next_requester: Some(requester),
                            notices: vec![(
                                NoticeTarget::Requester(requester),
                                NoticeKind::Approved,
                            )],
                        })
                    } else {
                        Ok(Transition {
                            next_state: SlotState::Free,
                            next_requester: None,
                            notices: vec![(
                                NoticeTarget::Requester(requester),
                                NoticeKind::Rejected,
                            )],
                        })
                    }
                }
                _ => Err(invalid_state(action, slot.state)),
            }
        }
        BookingAction::Withdraw => {
            if actor.role != Role::Requester {
                return Err(BookingError::Forbidden);
            }
            match slot.state {
                SlotState::Requested => {
                    if slot.requester_id != Some(actor.participant_id) {
                        return Err(BookingError::NotOwner);
                    }
                    Ok(Transition {
                        next_state: SlotState::Free,
                        next_requester: None,
                        notices: vec![(NoticeTarget::Authority, NoticeKind::Withdrawn)],
                    })
                }
                _ => Err(invalid_state(action, slot.state)),
            }
        }
        BookingAction::CancelByAuthority => {
            if actor.role != Role::Authority {
                return Err(BookingError::Forbidden);
            }
            match (slot.state, slot.requester_id) {
                (SlotState::Confirmed, Some(requester)) => Ok(Transition {
                    next_state: SlotState::Free,
                    next_requester: None,
                    notices: vec![(
                        NoticeTarget::Requester(requester),
                        NoticeKind::CancelledByAuthority,
                    )],
                }),
                _ => Err(invalid_state(action, slot.state)),
            }
        }
        BookingAction::CancelByRequester => {
            if actor.role != Role::Requester {
                return Err(BookingError::Forbidden);
            }
            match slot.state {
                SlotState::Confirmed => {
                    if slot.requester_id != Some(actor.participant_id) {
                        return Err(BookingError::NotOwner);
                    }
                    Ok(Transition {
                        next_state: SlotState::Free,
                        next_requester: None,
                        notices: vec![(NoticeTarget::Authority, NoticeKind::CancelledByRequester)],
                    })
                }
                _ => Err(invalid_state(action, slot.state)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    const ACTIONS: [BookingAction; 6] = [
        BookingAction::Request,
        BookingAction::Approve,
        BookingAction::Reject,
        BookingAction::Withdraw,
        BookingAction::CancelByAuthority,
        BookingAction::CancelByRequester,
    ];

    fn slot_in(state: SlotState, requester_id: Option<Uuid>) -> Slot {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        Slot {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            start,
            end: start + chrono::Duration::hours(1),
            subject: None,
            state,
            requester_id,
            created_at: start,
            updated_at: start,
        }
    }

    fn requester(id: Uuid) -> Actor {
        Actor {
            participant_id: id,
            role: Role::Requester,
        }
    }

    fn authority() -> Actor {
        Actor {
            participant_id: Uuid::new_v4(),
            role: Role::Authority,
        }
    }

    /// Every accepted transition, from every reachable slot
    /// configuration, under every actor, lands in one of the three
    /// states with the requester set exactly when the state is not
    /// `Free`. One accepted step preserving the invariant from every
    /// reachable configuration covers arbitrary sequences by
    /// induction.
    #[test]
    fn accepted_transitions_preserve_requester_invariant() {
        let holder = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let configs = [
            (SlotState::Free, None),
            (SlotState::Requested, Some(holder)),
            (SlotState::Confirmed, Some(holder)),
        ];
        let actors = [authority(), requester(holder), requester(stranger)];

        for (state, requester_id) in configs {
            for actor in actors {
                for action in ACTIONS {
                    let slot = slot_in(state, requester_id);
                    if let Ok(t) = transition(&slot, actor, action) {
                        assert_eq!(
                            t.next_state == SlotState::Free,
                            t.next_requester.is_none(),
                            "invariant broken by {action:?} from {state:?}",
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn request_on_free_slot_records_requester_and_notifies_authority() {
        let student = Uuid::new_v4();
        let t = transition(
            &slot_in(SlotState::Free, None),
            requester(student),
            BookingAction::Request,
        )
        .unwrap();

        assert_eq!(t.next_state, SlotState::Requested);
        assert_eq!(t.next_requester, Some(student));
        assert_eq!(
            t.notices,
            vec![(NoticeTarget::Authority, NoticeKind::NewRequest)]
        );
    }

    #[test]
    fn request_on_claimed_slot_is_already_taken() {
        let holder = Uuid::new_v4();
        for state in [SlotState::Requested, SlotState::Confirmed] {
            let err = transition(
                &slot_in(state, Some(holder)),
                requester(Uuid::new_v4()),
                BookingAction::Request,
            )
            .unwrap_err();
            assert!(matches!(err, BookingError::AlreadyTaken));
        }
    }

    #[test]
    fn approve_confirms_and_notifies_requester() {
        let holder = Uuid::new_v4();
        let t = transition(
            &slot_in(SlotState::Requested, Some(holder)),
            authority(),
            BookingAction::Approve,
        )
        .unwrap();

        assert_eq!(t.next_state, SlotState::Confirmed);
        assert_eq!(t.next_requester, Some(holder));
        assert_eq!(
            t.notices,
            vec![(NoticeTarget::Requester(holder), NoticeKind::Approved)]
        );
    }

    #[test]
    fn reject_frees_slot_and_notifies_requester() {
        let holder = Uuid::new_v4();
        let t = transition(
            &slot_in(SlotState::Requested, Some(holder)),
            authority(),
            BookingAction::Reject,
        )
        .unwrap();

        assert_eq!(t.next_state, SlotState::Free);
        assert_eq!(t.next_requester, None);
        assert_eq!(
            t.notices,
            vec![(NoticeTarget::Requester(holder), NoticeKind::Rejected)]
        );
    }

    #[test]
    fn approve_outside_requested_state_is_invalid() {
        for (state, requester_id) in [
            (SlotState::Free, None),
            (SlotState::Confirmed, Some(Uuid::new_v4())),
        ] {
            let err = transition(
                &slot_in(state, requester_id),
                authority(),
                BookingAction::Approve,
            )
            .unwrap_err();
            assert!(matches!(err, BookingError::InvalidState { .. }));
        }
    }

    #[test]
    fn withdraw_requires_the_current_requester() {
        let holder = Uuid::new_v4();
        let slot = slot_in(SlotState::Requested, Some(holder));

        let err = transition(&slot, requester(Uuid::new_v4()), BookingAction::Withdraw).unwrap_err();
        assert!(matches!(err, BookingError::NotOwner));

        let t = transition(&slot, requester(holder), BookingAction::Withdraw).unwrap();
        assert_eq!(t.next_state, SlotState::Free);
        assert_eq!(
            t.notices,
            vec![(NoticeTarget::Authority, NoticeKind::Withdrawn)]
        );
    }

    #[test]
    fn cancel_by_requester_requires_the_holder() {
        let holder = Uuid::new_v4();
        let slot = slot_in(SlotState::Confirmed, Some(holder));

        let err = transition(
            &slot,
            requester(Uuid::new_v4()),
            BookingAction::CancelByRequester,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::NotOwner));

        let t = transition(&slot, requester(holder), BookingAction::CancelByRequester).unwrap();
        assert_eq!(t.next_state, SlotState::Free);
        assert_eq!(t.next_requester, None);
        assert_eq!(
            t.notices,
            vec![(NoticeTarget::Authority, NoticeKind::CancelledByRequester)]
        );
    }

    #[test]
    fn cancel_by_authority_only_applies_to_confirmed_slots() {
        let holder = Uuid::new_v4();

        let err = transition(
            &slot_in(SlotState::Requested, Some(holder)),
            authority(),
            BookingAction::CancelByAuthority,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::InvalidState { .. }));

        let t = transition(
            &slot_in(SlotState::Confirmed, Some(holder)),
            authority(),
            BookingAction::CancelByAuthority,
        )
        .unwrap();
        assert_eq!(t.next_state, SlotState::Free);
        assert_eq!(
            t.notices,
            vec![(
                NoticeTarget::Requester(holder),
                NoticeKind::CancelledByAuthority
            )]
        );
    }

    #[test]
    fn role_mismatches_are_forbidden() {
        let holder = Uuid::new_v4();

        // A requester cannot decide on requests.
        for action in [BookingAction::Approve, BookingAction::Reject] {
            let err = transition(
                &slot_in(SlotState::Requested, Some(holder)),
                requester(holder),
                action,
            )
            .unwrap_err();
            assert!(matches!(err, BookingError::Forbidden));
        }

        // The authority cannot claim its own slot or act as a student.
        for action in [
            BookingAction::Request,
            BookingAction::Withdraw,
            BookingAction::CancelByRequester,
        ] {
            let slot = slot_in(SlotState::Free, None);
            let err = transition(&slot, authority(), action).unwrap_err();
            assert!(matches!(err, BookingError::Forbidden));
        }
    }
}
