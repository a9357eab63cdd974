//! Tenant-scoped device registry endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use fleetward_core::models::device::{Device, DeviceFilter, DeviceStatus};
use fleetward_core::repository::Pagination;
use serde::Deserialize;
use tracing::info;

use super::TOTAL_COUNT;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthContext, OperatorContext};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListDevicesParams {
    pub status: Option<DeviceStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Body of `PATCH /api/devices/{uid}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameDevice {
    pub name: String,
}

pub async fn get_device(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(uid): ApiPath<String>,
) -> ApiResult<Json<Device>> {
    auth.ensure_may_read_device(&uid)?;
    Ok(Json(state.devices.get(&auth.tenant_id, &uid).await?))
}

pub async fn list_devices(
    State(state): State<AppState>,
    OperatorContext(auth): OperatorContext,
    ApiQuery(params): ApiQuery<ListDevicesParams>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .devices
        .list(
            &auth.tenant_id,
            DeviceFilter {
                status: params.status,
            },
            Pagination::from_page(params.page, params.per_page),
        )
        .await?;

    Ok(([(TOTAL_COUNT, page.total.to_string())], Json(page.items)))
}

pub async fn rename_device(
    State(state): State<AppState>,
    OperatorContext(auth): OperatorContext,
    ApiPath(uid): ApiPath<String>,
    ApiJson(body): ApiJson<RenameDevice>,
) -> ApiResult<Json<Device>> {
    let device = state
        .devices
        .rename(&auth.tenant_id, &uid, &body.name)
        .await?;
    info!(
        uid = %uid,
        by = auth.acting_user.as_deref().unwrap_or("-"),
        "Rename requested"
    );
    Ok(Json(device))
}

pub async fn accept_device(
    State(state): State<AppState>,
    OperatorContext(auth): OperatorContext,
    ApiPath(uid): ApiPath<String>,
) -> ApiResult<Json<Device>> {
    Ok(Json(state.devices.accept(&auth.tenant_id, &uid).await?))
}

pub async fn delete_device(
    State(state): State<AppState>,
    OperatorContext(auth): OperatorContext,
    ApiPath(uid): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.devices.delete(&auth.tenant_id, &uid).await?;
    info!(
        uid = %uid,
        by = auth.acting_user.as_deref().unwrap_or("-"),
        "Delete requested"
    );
    Ok(StatusCode::OK)
}
