//! Login, device authentication and internal token minting.

use axum::Json;
use axum::extract::State;
use fleetward_auth::LoginInput;
use fleetward_core::models::device::DeviceAuthRequest;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extract::{ApiForm, ApiJson, ApiPath};
use crate::state::AppState;

/// Form body of `POST /api/login`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: String,
    pub name: String,
    pub tenant: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceAuthResponse {
    pub name: String,
    pub namespace: String,
    pub token: String,
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> ApiResult<Json<LoginResponse>> {
    let out = state
        .auth
        .login(LoginInput {
            username: form.username,
            password: form.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        user: out.user,
        name: out.name,
        tenant: out.tenant,
        email: out.email,
        token: out.token,
    }))
}

pub async fn authenticate_device(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DeviceAuthRequest>,
) -> ApiResult<Json<DeviceAuthResponse>> {
    let out = state.auth.authenticate_device(req).await?;
    Ok(Json(DeviceAuthResponse {
        name: out.name,
        namespace: out.namespace,
        token: out.token,
        uid: out.uid,
    }))
}

pub async fn internal_token(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<String>,
) -> ApiResult<Json<TokenResponse>> {
    let token = state.auth.issue_internal_token(&tenant_id).await?;
    Ok(Json(TokenResponse { token }))
}
