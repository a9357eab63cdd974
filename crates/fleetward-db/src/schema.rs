//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Device and session uids are the record ids, which gives the
//! storage layer the uniqueness guarantee enrollment relies on.

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
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD owner ON TABLE tenant TYPE string;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Users (username unique across tenants)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE user TYPE string;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user \
    COLUMNS username UNIQUE;
DEFINE INDEX idx_user_tenant ON TABLE user COLUMNS tenant_id;

-- =======================================================================
-- Devices (record id = device uid)
-- =======================================================================
DEFINE TABLE device SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE device TYPE string;
DEFINE FIELD name ON TABLE device TYPE string;
DEFINE FIELD namespace ON TABLE device TYPE string;
DEFINE FIELD mac ON TABLE device TYPE string;
DEFINE FIELD info_id ON TABLE device TYPE string;
DEFINE FIELD info_pretty_name ON TABLE device TYPE string;
DEFINE FIELD info_version ON TABLE device TYPE string;
DEFINE FIELD public_key ON TABLE device TYPE string;
DEFINE FIELD status ON TABLE device TYPE string \
    ASSERT $value IN ['pending', 'accepted'];
DEFINE FIELD last_seen ON TABLE device TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD created_at ON TABLE device TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE device TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_device_tenant_status ON TABLE device \
    COLUMNS tenant_id, status;
DEFINE INDEX idx_device_tenant_name ON TABLE device \
    COLUMNS tenant_id, name;

-- =======================================================================
-- Sessions (record id = session uid)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE session TYPE string;
DEFINE FIELD device_uid ON TABLE session TYPE string;
DEFINE FIELD username ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD authenticated ON TABLE session TYPE bool DEFAULT false;
DEFINE FIELD started_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD last_seen ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD finished_at ON TABLE session TYPE option<datetime>;
DEFINE INDEX idx_session_tenant ON TABLE session COLUMNS tenant_id;
DEFINE INDEX idx_session_device ON TABLE session \
    COLUMNS tenant_id, device_uid;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

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

        db.query("CREATE _migration SET version = $version, name = $name")
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
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
