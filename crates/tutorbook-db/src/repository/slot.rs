//! SurrealDB implementation of `SlotRepository`.
//!
//! Two details carry the concurrency contract: `create` checks for
//! intersecting intervals inside the same transaction as the insert,
//! and `update_state` is a single conditional UPDATE, so the engine
//! serializes competing transitions on one record.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tutorbook_core::error::{BookingError, BookingResult};
use tutorbook_core::models::slot::{CreateSlot, Slot, SlotState};
use tutorbook_core::repository::{SlotFilter, SlotRepository};
use uuid::Uuid;

use crate::error::DbError;

/// Marker thrown by the create transaction when the interval clashes.
const OVERLAP_SIGNAL: &str = "slot_overlap";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SlotRow {
    owner_id: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    subject: Option<String>,
    state: String,
    requester_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SlotRowWithId {
    record_id: String,
    owner_id: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    subject: Option<String>,
    state: String,
    requester_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_state(s: &str) -> Result<SlotState, DbError> {
    match s {
        "Free" => Ok(SlotState::Free),
        "Requested" => Ok(SlotState::Requested),
        "Confirmed" => Ok(SlotState::Confirmed),
        other => Err(DbError::Corrupt(format!("unknown slot state: {other}"))),
    }
}

fn state_to_string(s: SlotState) -> &'static str {
    match s {
        SlotState::Free => "Free",
        SlotState::Requested => "Requested",
        SlotState::Confirmed => "Confirmed",
    }
}

fn parse_requester(requester_id: Option<String>) -> Result<Option<Uuid>, DbError> {
    requester_id
        .map(|s| {
            Uuid::parse_str(&s).map_err(|e| DbError::Corrupt(format!("invalid requester UUID: {e}")))
        })
        .transpose()
}

impl SlotRow {
    fn into_slot(self, id: Uuid) -> Result<Slot, DbError> {
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| DbError::Corrupt(format!("invalid owner UUID: {e}")))?;
        Ok(Slot {
            id,
            owner_id,
            start: self.start_at,
            end: self.end_at,
            subject: self.subject,
            state: parse_state(&self.state)?,
            requester_id: parse_requester(self.requester_id)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SlotRowWithId {
    fn try_into_slot(self) -> Result<Slot, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Corrupt(format!("invalid UUID: {e}")))?;
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| DbError::Corrupt(format!("invalid owner UUID: {e}")))?;
        Ok(Slot {
            id,
            owner_id,
            start: self.start_at,
            end: self.end_at,
            subject: self.subject,
            state: parse_state(&self.state)?,
            requester_id: parse_requester(self.requester_id)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Slot repository.
#[derive(Clone)]
pub struct SurrealSlotRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSlotRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SlotRepository for SurrealSlotRepository<C> {
    async fn create(&self, input: CreateSlot) -> BookingResult<Slot> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // The clash check and the insert commit or roll back together;
        // the unique (owner, bounds) index backstops exact duplicates.
        let result = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                 LET $clash = (SELECT VALUE id FROM slot \
                     WHERE owner_id = $owner_id \
                     AND start_at < $end_at AND end_at > $start_at); \
                 IF array::len($clash) > 0 {{ THROW '{OVERLAP_SIGNAL}' }}; \
                 CREATE type::record('slot', $id) SET \
                     owner_id = $owner_id, \
                     start_at = $start_at, \
                     end_at = $end_at, \
                     subject = $subject, \
                     state = 'Free', \
                     requester_id = NONE; \
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("start_at", input.start))
            .bind(("end_at", input.end))
            .bind(("subject", input.subject))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(result) => result,
            Err(e) if is_overlap_violation(&e) => return Err(BookingError::Overlap),
            Err(e) => return Err(DbError::from(e).into()),
        };

        // The CREATE is the last result-bearing statement.
        let create_index = result.num_statements() - 1;
        let rows: Vec<SlotRow> = result.take(create_index).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "slot".into(),
            id: id_str,
        })?;

        Ok(row.into_slot(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> BookingResult<Slot> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('slot', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SlotRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "slot".into(),
            id: id_str,
        })?;

        Ok(row.into_slot(id)?)
    }

    async fn list(&self, owner_id: Uuid, filter: SlotFilter) -> BookingResult<Vec<Slot>> {
        let mut clauses = vec!["owner_id = $owner_id"];
        if filter.state.is_some() {
            clauses.push("state = $state");
        }
        if filter.requester_id.is_some() {
            clauses.push("requester_id = $requester_id");
        }
        if filter.from.is_some() {
            clauses.push("start_at >= $from");
        }
        if filter.until.is_some() {
            clauses.push("start_at <= $until");
        }

        let sql = format!(
            "SELECT meta::id(id) AS record_id, * FROM slot \
             WHERE {} ORDER BY start_at ASC",
            clauses.join(" AND "),
        );

        let mut query = self.db.query(sql).bind(("owner_id", owner_id.to_string()));
        if let Some(state) = filter.state {
            query = query.bind(("state", state_to_string(state).to_string()));
        }
        if let Some(requester_id) = filter.requester_id {
            query = query.bind(("requester_id", requester_id.to_string()));
        }
        if let Some(from) = filter.from {
            query = query.bind(("from", from));
        }
        if let Some(until) = filter.until {
            query = query.bind(("until", until));
        }

        let mut result = query.await.map_err(DbError::from)?;
        let rows: Vec<SlotRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut slots = Vec::with_capacity(rows.len());
        for row in rows {
            slots.push(row.try_into_slot()?);
        }
        Ok(slots)
    }

    async fn free_dates(
        &self,
        owner_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BookingResult<BTreeSet<NaiveDate>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE time::format(start_at, '%Y-%m-%d') FROM slot \
                 WHERE owner_id = $owner_id AND state = 'Free' \
                 AND start_at >= $from AND start_at <= $until",
            )
            .bind(("owner_id", owner_id.to_string()))
            .bind(("from", from))
            .bind(("until", until))
            .await
            .map_err(DbError::from)?;

        let days: Vec<String> = result.take(0).map_err(DbError::from)?;

        let mut dates = BTreeSet::new();
        for day in days {
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| DbError::Corrupt(format!("invalid slot date '{day}': {e}")))?;
            dates.insert(date);
        }
        Ok(dates)
    }

    async fn update_state(
        &self,
        id: Uuid,
        expected_state: SlotState,
        expected_requester: Option<Uuid>,
        next_state: SlotState,
        next_requester: Option<Uuid>,
    ) -> BookingResult<Option<Slot>> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('slot', $id) SET \
                 state = $next_state, \
                 requester_id = $next_requester, \
                 updated_at = time::now() \
                 WHERE state = $expected_state \
                 AND requester_id = $expected_requester \
                 RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("expected_state", state_to_string(expected_state).to_string()))
            .bind((
                "expected_requester",
                expected_requester.map(|r| r.to_string()),
            ))
            .bind(("next_state", state_to_string(next_state).to_string()))
            .bind(("next_requester", next_requester.map(|r| r.to_string())))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SlotRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_slot(id)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> BookingResult<()> {
        self.db
            .query("DELETE type::record('slot', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}

fn is_overlap_violation(e: &surrealdb::Error) -> bool {
    let message = e.to_string();
    message.contains(OVERLAP_SIGNAL) || message.contains("idx_slot_owner_bounds")
}
