//! Booking service configuration.

/// Configuration for the booking coordinator.
///
/// The authority identity lives here and is passed in at construction;
/// business logic never reads it from global or environment state.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// External chat identifier of the scheduling authority.
    pub authority_id: i64,
    /// How many times a transition is re-decided after losing a
    /// compare-and-set race before `Conflict` is surfaced.
    pub max_transition_retries: u32,
    /// Bounded look-ahead for availability queries, in days.
    pub horizon_days: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            authority_id: 0,
            max_transition_retries: 3,
            horizon_days: 365,
        }
    }
}
