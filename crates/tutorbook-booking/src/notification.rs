//! Notification intents — who must be told what.
//!
//! An intent is a description, not a delivery: the dispatch layer
//! renders and sends it best-effort, and a failed send never rolls
//! back the transition that produced it.

use serde::{Deserialize, Serialize};
use tutorbook_core::machine::NoticeKind;
use tutorbook_core::models::slot::Slot;

/// One pending notification, addressed by external chat identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub recipient: i64,
    pub kind: NoticeKind,
    /// Snapshot of the slot as persisted by the transition that
    /// produced this intent.
    pub slot: Slot,
}
