//! Fleetward Auth — user login, device enrollment-by-authentication,
//! internal token minting and EdDSA JWT validation.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, DeviceAuthOutput, LoginInput, LoginOutput};
pub use token::{AccessTokenClaims, TokenKind, ValidatedClaims};
