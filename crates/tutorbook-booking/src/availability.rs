//! Read-side availability queries.
//!
//! Derives, from the slot store, the calendar dates that still have
//! open capacity. Uncached on purpose: a stale answer here would send
//! callers at already-claimed slots, and the state machine would then
//! reject every one of them.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tutorbook_core::error::BookingResult;
use tutorbook_core::repository::SlotRepository;
use uuid::Uuid;

/// Read-only availability view over the slot store.
pub struct AvailabilityIndex<S: SlotRepository> {
    slots: S,
    horizon_days: u32,
}

impl<S: SlotRepository> AvailabilityIndex<S> {
    pub fn new(slots: S, horizon_days: u32) -> Self {
        Self { slots, horizon_days }
    }

    /// Calendar dates in `[from, until]` with at least one free slot
    /// for the owner.
    pub async fn free_dates(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BookingResult<BTreeSet<NaiveDate>> {
        self.slots.free_dates(owner_id, from, until).await
    }

    /// Availability over the configured horizon starting at `now`.
    pub async fn free_dates_ahead(
        &self,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> BookingResult<BTreeSet<NaiveDate>> {
        let until = now + Duration::days(i64::from(self.horizon_days));
        self.free_dates(owner_id, now, until).await
    }
}

/// Whether a month contains at least one available date.
///
/// Drives sparse month navigation: a month is reachable from the
/// calendar view iff this returns true, without the UI querying slot
/// details.
pub fn month_has_free_date(dates: &BTreeSet<NaiveDate>, year: i32, month: u32) -> bool {
    dates
        .iter()
        .any(|date| date.year() == year && date.month() == month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_reachability_follows_available_dates() {
        let dates: BTreeSet<NaiveDate> =
            [date(2025, 3, 1), date(2025, 3, 14), date(2025, 5, 2)].into();

        assert!(month_has_free_date(&dates, 2025, 3));
        assert!(month_has_free_date(&dates, 2025, 5));
        assert!(!month_has_free_date(&dates, 2025, 4));
        assert!(!month_has_free_date(&dates, 2024, 3));
    }

    #[test]
    fn empty_index_reaches_no_month() {
        assert!(!month_has_free_date(&BTreeSet::new(), 2025, 1));
    }
}
