use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::finance_movement::{
    CreateFinanceMovement, FinanceMovement, MovementFilter, UpdateFinanceMovement,
};
use services::services::{
    farm_access::FarmAccess,
    finance_summary::{FinanceSummary, summarize},
    validation::validate_movement,
};
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

pub async fn list_movements(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Query(filter): Query<MovementFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<FinanceMovement>>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let movements = FinanceMovement::find_by_farm_id(pool, farm_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(movements)))
}

pub async fn create_movement(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Json(payload): Json<CreateFinanceMovement>,
) -> Result<ResponseJson<ApiResponse<FinanceMovement>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    validate_movement(&payload)?;
    let movement = FinanceMovement::create(pool, farm_id, &payload, Uuid::new_v4()).await?;
    info!(
        farm_id = %farm_id,
        movement_id = %movement.id,
        movement_type = %movement.movement_type,
        "Recorded finance movement"
    );
    Ok(ResponseJson(ApiResponse::success(movement)))
}

pub async fn update_movement(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, movement_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateFinanceMovement>,
) -> Result<ResponseJson<ApiResponse<FinanceMovement>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    validate_movement(&payload)?;
    let movement = FinanceMovement::update(pool, movement_id, farm_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("movement"))?;
    Ok(ResponseJson(ApiResponse::success(movement)))
}

pub async fn delete_movement(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, movement_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    if FinanceMovement::delete(pool, movement_id, farm_id).await? == 0 {
        return Err(ApiError::NotFound("movement"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Totals over the movements matching the same filters as the listing.
pub async fn finance_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Query(filter): Query<MovementFilter>,
) -> Result<ResponseJson<ApiResponse<FinanceSummary>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let movements = FinanceMovement::find_by_farm_id(pool, farm_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(summarize(&movements))))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/farms/{farm_id}/finance/movements",
            get(list_movements).post(create_movement),
        )
        .route(
            "/farms/{farm_id}/finance/movements/{movement_id}",
            put(update_movement).delete(delete_movement),
        )
        .route("/farms/{farm_id}/finance/summary", get(finance_summary))
}
