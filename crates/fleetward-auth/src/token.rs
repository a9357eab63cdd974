//! EdDSA JWT issuance and verification.
//!
//! Three kinds of token share one claim set: user tokens from
//! `/api/login`, device tokens from `/api/devices/auth`, and service
//! tokens minted for internal callers. All of them carry the tenant the
//! bearer acts in.

use chrono::Utc;
use fleetward_core::models::device::Device;
use fleetward_core::models::user::User;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    User,
    Device,
    Service,
}

/// JWT claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: user id, device uid or `service:<tenant>`.
    pub sub: String,
    pub tenant_id: String,
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_uid: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl AccessTokenClaims {
    fn new(
        sub: String,
        tenant_id: &str,
        kind: TokenKind,
        lifetime_secs: u64,
        iss: &str,
    ) -> Result<Self, AuthError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(lifetime_secs)
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| AuthError::Config(format!("token lifetime {lifetime_secs}s is out of range")))?;
        Ok(Self {
            sub,
            tenant_id: tenant_id.to_string(),
            kind,
            username: None,
            device_uid: None,
            iss: iss.to_string(),
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
        })
    }
}

fn sign(claims: &AccessTokenClaims, config: &AuthConfig) -> Result<String, AuthError> {
    let key = EncodingKey::from_ed_pem(config.jwt_private_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))?;

    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Issue a token for an authenticated user.
pub fn issue_user_token(user: &User, config: &AuthConfig) -> Result<String, AuthError> {
    let mut claims = AccessTokenClaims::new(
        user.id.to_string(),
        &user.tenant_id,
        TokenKind::User,
        config.access_token_lifetime_secs,
        &config.jwt_issuer,
    )?;
    claims.username = Some(user.username.clone());
    sign(&claims, config)
}

/// Issue a token for an enrolled device.
pub fn issue_device_token(device: &Device, config: &AuthConfig) -> Result<String, AuthError> {
    let mut claims = AccessTokenClaims::new(
        device.uid.clone(),
        &device.tenant_id,
        TokenKind::Device,
        config.device_token_lifetime_secs,
        &config.jwt_issuer,
    )?;
    claims.device_uid = Some(device.uid.clone());
    sign(&claims, config)
}

/// Issue a tenant-scoped token for an internal service.
pub fn issue_service_token(tenant_id: &str, config: &AuthConfig) -> Result<String, AuthError> {
    let claims = AccessTokenClaims::new(
        format!("service:{tenant_id}"),
        tenant_id,
        TokenKind::Service,
        config.access_token_lifetime_secs,
        &config.jwt_issuer,
    )?;
    sign(&claims, config)
}

/// Decode and verify an EdDSA JWT.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    let key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Claims of a token whose signature, expiry and issuer were checked.
#[derive(Debug, Clone)]
pub struct ValidatedClaims(pub AccessTokenClaims);

impl ValidatedClaims {
    pub fn tenant_id(&self) -> &str {
        &self.0.tenant_id
    }

    pub fn kind(&self) -> TokenKind {
        self.0.kind
    }
}

/// Stateless token check used by the request extractors.
pub fn validate_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<ValidatedClaims, AuthError> {
    decode_access_token(token, config).map(ValidatedClaims)
}
