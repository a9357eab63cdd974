//! Database-specific error types and conversions.

use fleetward_core::error::FleetError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Password hashing failed: {0}")]
    Password(String),

    #[error("Seed failed: {0}")]
    Seed(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for FleetError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => FleetError::NotFound { entity, id },
            other => FleetError::Database(other.to_string()),
        }
    }
}
