//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// User and internal token lifetime in seconds (default: 3600).
    pub access_token_lifetime_secs: u64,
    /// Device token lifetime in seconds (default: 86_400 = 1 day).
    pub device_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            jwt_issuer: "fleetward".into(),
            access_token_lifetime_secs: 3600,
            device_token_lifetime_secs: 86_400,
            pepper: None,
        }
    }
}
