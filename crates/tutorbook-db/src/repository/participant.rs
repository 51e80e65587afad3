//! SurrealDB implementation of `ParticipantRepository`.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tutorbook_core::error::BookingResult;
use tutorbook_core::models::participant::{CreateParticipant, Participant};
use tutorbook_core::repository::ParticipantRepository;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ParticipantRow {
    external_id: i64,
    display_name: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ParticipantRowWithId {
    record_id: String,
    external_id: i64,
    display_name: String,
    created_at: DateTime<Utc>,
}

fn row_to_participant(row: ParticipantRow, id: Uuid) -> Participant {
    Participant {
        id,
        external_id: row.external_id,
        display_name: row.display_name,
        created_at: row.created_at,
    }
}

impl ParticipantRowWithId {
    fn try_into_participant(self) -> Result<Participant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Corrupt(format!("invalid participant UUID: {e}")))?;
        Ok(Participant {
            id,
            external_id: self.external_id,
            display_name: self.display_name,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Participant repository.
#[derive(Clone)]
pub struct SurrealParticipantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealParticipantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_by_external(&self, external_id: i64) -> BookingResult<Option<Participant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM participant \
                 WHERE external_id = $external_id",
            )
            .bind(("external_id", external_id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ParticipantRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_participant()?)),
            None => Ok(None),
        }
    }
}

impl<C: Connection> ParticipantRepository for SurrealParticipantRepository<C> {
    async fn get_or_create(&self, input: CreateParticipant) -> BookingResult<Participant> {
        if let Some(existing) = self.find_by_external(input.external_id).await? {
            return Ok(existing);
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('participant', $id) SET \
                 external_id = $external_id, \
                 display_name = $display_name",
            )
            .bind(("id", id_str.clone()))
            .bind(("external_id", input.external_id))
            .bind(("display_name", input.display_name))
            .await
            .map_err(DbError::from)?;

        match result.check() {
            Ok(mut result) => {
                let rows: Vec<ParticipantRow> = result.take(0).map_err(DbError::from)?;
                let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                    entity: "participant".into(),
                    id: id_str,
                })?;
                Ok(row_to_participant(row, id))
            }
            // Lost a create race on the unique external_id index; the
            // winner's row is this participant.
            Err(e) if e.to_string().contains("idx_participant_external") => self
                .find_by_external(input.external_id)
                .await?
                .ok_or_else(|| {
                    DbError::NotFound {
                        entity: "participant".into(),
                        id: format!("external_id={}", input.external_id),
                    }
                    .into()
                }),
            Err(e) => Err(DbError::from(e).into()),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> BookingResult<Participant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('participant', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ParticipantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "participant".into(),
            id: id_str,
        })?;

        Ok(row_to_participant(row, id))
    }

    async fn get_by_external_id(&self, external_id: i64) -> BookingResult<Participant> {
        self.find_by_external(external_id).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "participant".into(),
                id: format!("external_id={external_id}"),
            }
            .into()
        })
    }
}
