//! Error types for the Fleetward system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// The caller's tenant does not own the addressed record, or a
    /// tenant header disagrees with the bearer token.
    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FleetError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        FleetError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        FleetError::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        FleetError::Conflict {
            reason: reason.into(),
        }
    }
}

pub type FleetResult<T> = Result<T, FleetError>;
