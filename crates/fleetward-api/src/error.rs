//! HTTP error mapping.
//!
//! Every handler returns [`ApiResult`]; domain errors are turned into a
//! JSON body `{"error": <message>, "status": <code>}`. Server-side
//! details are logged and replaced by a generic message.

use axum::Json;
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fleetward_core::error::FleetError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fleet(#[from] FleetError),

    /// Malformed request: bad JSON, form, path or query.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or rejected bearer token.
    #[error("{0}")]
    Unauthorized(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Fleet(err) => match err {
                FleetError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                FleetError::AlreadyExists { .. } | FleetError::Conflict { .. } => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                FleetError::AuthenticationFailed { .. } | FleetError::TenantContext => {
                    (StatusCode::UNAUTHORIZED, err.to_string())
                }
                FleetError::Validation { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
                FleetError::Database(detail) => {
                    tracing::error!(error = %detail, "Storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "storage unavailable".to_string(),
                    )
                }
                FleetError::Crypto(detail) | FleetError::Internal(detail) => {
                    tracing::error!(error = %detail, "Internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status_of(FleetError::not_found("device", "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(FleetError::AlreadyExists {
                entity: "session".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(FleetError::conflict("busy")), StatusCode::CONFLICT);
        assert_eq!(
            status_of(FleetError::TenantContext),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(FleetError::AuthenticationFailed {
                reason: "invalid credentials".into()
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(FleetError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FleetError::Database("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(FleetError::Crypto("bad key".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let err = ApiError::from(FleetError::Database("connection refused at 10.0.0.5".into()));
        let (_, message) = err.status_and_message();
        assert_eq!(message, "storage unavailable");
    }

    #[test]
    fn request_errors_are_bad_requests() {
        assert_eq!(
            ApiError::BadRequest("missing field".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("missing bearer token".into())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
