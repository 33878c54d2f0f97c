use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Utc;
use services::services::{
    farm_access::FarmAccess,
    finance_insights::{FinanceInsights, InsightsQuery, load_finance_insights},
};
use tracing::debug;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

pub async fn finance_insights(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Query(query): Query<InsightsQuery>,
) -> Result<ResponseJson<ApiResponse<FinanceInsights>>, ApiError> {
    let window_days = query.window_days()?;
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let insights =
        load_finance_insights(pool, farm_id, Utc::now().date_naive(), window_days).await?;
    debug!(
        farm_id = %farm_id,
        score = insights.health.score,
        anomalies = insights.anomalies.len(),
        "Computed finance insights"
    );
    Ok(ResponseJson(ApiResponse::success(insights)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/farms/{farm_id}/finance/insights", get(finance_insights))
}
