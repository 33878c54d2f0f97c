use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Utc;
use services::services::{
    farm_access::FarmAccess,
    zone_report::{ZoneReport, load_zone_report},
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

pub async fn zone_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, zone_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ZoneReport>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let report = load_zone_report(pool, farm_id, zone_id, Utc::now().date_naive())
        .await?
        .ok_or(ApiError::NotFound("zone"))?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/farms/{farm_id}/zones/{id}/report", get(zone_report))
}
