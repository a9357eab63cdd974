use axum::Json;
use axum::extract::State;
use fleetward_core::models::stats::Stats;

use crate::error::ApiResult;
use crate::extract::OperatorContext;
use crate::state::AppState;

pub async fn get_stats(
    State(state): State<AppState>,
    OperatorContext(auth): OperatorContext,
) -> ApiResult<Json<Stats>> {
    Ok(Json(state.devices.stats(&auth.tenant_id).await?))
}
