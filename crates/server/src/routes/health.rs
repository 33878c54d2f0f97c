use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::Serialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, TS)]
pub struct HealthStatus {
    pub status: String,
    pub database: bool,
}

/// GET /api/health
pub async fn health(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<HealthStatus>>, ApiError> {
    sqlx::query("SELECT 1").execute(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        database: true,
    })))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/health", get(health))
}
