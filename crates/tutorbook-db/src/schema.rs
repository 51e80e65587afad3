//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. The slot state enum is stored as a
//! string with an ASSERT constraint for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Participants
-- =======================================================================
DEFINE TABLE participant SCHEMAFULL;
DEFINE FIELD external_id ON TABLE participant TYPE int;
DEFINE FIELD display_name ON TABLE participant TYPE string;
DEFINE FIELD created_at ON TABLE participant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_participant_external ON TABLE participant \
    COLUMNS external_id UNIQUE;

-- =======================================================================
-- Slots
-- =======================================================================
DEFINE TABLE slot SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE slot TYPE string;
DEFINE FIELD start_at ON TABLE slot TYPE datetime;
DEFINE FIELD end_at ON TABLE slot TYPE datetime;
DEFINE FIELD subject ON TABLE slot TYPE option<string>;
DEFINE FIELD state ON TABLE slot TYPE string \
    ASSERT $value IN ['Free', 'Requested', 'Confirmed'];
DEFINE FIELD requester_id ON TABLE slot TYPE option<string>;
DEFINE FIELD created_at ON TABLE slot TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE slot TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_slot_owner_bounds ON TABLE slot \
    COLUMNS owner_id, start_at, end_at UNIQUE;
DEFINE INDEX idx_slot_owner_state_start ON TABLE slot \
    COLUMNS owner_id, state, start_at;
";

/// Apply any migrations newer than the recorded schema version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
