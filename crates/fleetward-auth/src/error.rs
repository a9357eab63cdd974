//! Authentication error types.

use fleetward_core::error::FleetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("invalid auth configuration: {0}")]
    Config(String),
}

impl From<AuthError> for FleetError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => FleetError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => FleetError::Crypto(msg),
            AuthError::Config(msg) => FleetError::Internal(msg),
        }
    }
}
