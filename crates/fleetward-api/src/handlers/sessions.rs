//! Session endpoints: public reads and internal lifecycle updates.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use fleetward_core::models::session::{CreateSession, Session, SetSessionAuthenticated};
use fleetward_core::repository::Pagination;

use super::{PageParams, TOTAL_COUNT};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, InternalContext, OperatorContext};
use crate::state::AppState;

pub async fn get_session(
    State(state): State<AppState>,
    OperatorContext(auth): OperatorContext,
    ApiPath(uid): ApiPath<String>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.sessions.get(&auth.tenant_id, &uid).await?))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    OperatorContext(auth): OperatorContext,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .sessions
        .list(
            &auth.tenant_id,
            Pagination::from_page(params.page, params.per_page),
        )
        .await?;

    Ok(([(TOTAL_COUNT, page.total.to_string())], Json(page.items)))
}

pub async fn create_session(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSession>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.sessions.create(body).await?))
}

pub async fn set_authenticated(
    State(state): State<AppState>,
    ApiPath(uid): ApiPath<String>,
    ApiJson(body): ApiJson<SetSessionAuthenticated>,
) -> ApiResult<Json<Session>> {
    Ok(Json(
        state
            .sessions
            .set_authenticated(&uid, body.authenticated)
            .await?,
    ))
}

pub async fn finish_session(
    State(state): State<AppState>,
    InternalContext(ctx): InternalContext,
    ApiPath(uid): ApiPath<String>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.sessions.finish(&ctx, &uid).await?))
}

pub async fn keepalive(
    State(state): State<AppState>,
    ApiPath(uid): ApiPath<String>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.sessions.keepalive(&uid).await?))
}
