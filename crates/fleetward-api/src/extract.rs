//! Request extractors.
//!
//! Public routes authenticate with a bearer token and take the tenant
//! from its claims. Device tokens are only good for reading the device
//! they were issued to; everything else needs an [`OperatorContext`].
//! Internal routes never look at `Authorization`; the calling service
//! states its context in `X-Tenant-ID` / `X-Username`.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use fleetward_auth::{TokenKind, ValidatedClaims};
use fleetward_core::error::FleetError;
use fleetward_core::service::ServiceContext;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USERNAME_HEADER: &str = "x-username";

/// `axum::Json` with rejections mapped to 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::Form` with rejections mapped to 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

/// `axum::extract::Path` with rejections mapped to 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` with rejections mapped to 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map_err(|_| ApiError::BadRequest(format!("{name} header is not valid UTF-8")))
        })
        .transpose()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Caller of a public route, authenticated by bearer token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub tenant_id: String,
    pub kind: TokenKind,
    pub claims: ValidatedClaims,
    /// `X-Username` as sent by the caller; only used for logging.
    pub acting_user: Option<String>,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;
        let claims = state.auth.validate_token(token)?;

        if let Some(tenant) = header_str(&parts.headers, TENANT_HEADER)?
            && tenant != claims.tenant_id()
        {
            debug!(
                header = %tenant,
                token = %claims.tenant_id(),
                "Tenant header disagrees with token"
            );
            return Err(FleetError::TenantContext.into());
        }

        Ok(Self {
            tenant_id: claims.tenant_id().to_string(),
            kind: claims.kind(),
            acting_user: header_str(&parts.headers, USERNAME_HEADER)?.map(str::to_string),
            claims,
        })
    }
}

impl AuthContext {
    /// Users and internal services act for the whole tenant.
    pub fn is_operator(&self) -> bool {
        self.kind != TokenKind::Device
    }

    /// Operators may read any device of the tenant, a device only itself.
    pub fn ensure_may_read_device(&self, uid: &str) -> Result<(), ApiError> {
        if self.is_operator() || self.claims.0.device_uid.as_deref() == Some(uid) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized(
                "device tokens may only read their own device".into(),
            ))
        }
    }
}

/// Caller allowed to manage the tenant's devices and sessions: a user or
/// an internal service, never a device.
#[derive(Debug, Clone)]
pub struct OperatorContext(pub AuthContext);

impl FromRequestParts<AppState> for OperatorContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let auth = AuthContext::from_request_parts(parts, state).await?;
        if !auth.is_operator() {
            debug!(
                device_uid = auth.claims.0.device_uid.as_deref().unwrap_or("-"),
                path = %parts.uri.path(),
                "Device token rejected on operator route"
            );
            return Err(ApiError::Unauthorized(
                "device tokens cannot manage the tenant".into(),
            ));
        }
        Ok(Self(auth))
    }
}

/// Context of a trusted internal caller.
#[derive(Debug, Clone)]
pub struct InternalContext(pub ServiceContext);

impl<S: Send + Sync> FromRequestParts<S> for InternalContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        let non_empty = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Ok(Self(ServiceContext::new(
            non_empty(header_str(&parts.headers, TENANT_HEADER)?),
            non_empty(header_str(&parts.headers, USERNAME_HEADER)?),
        )))
    }
}
