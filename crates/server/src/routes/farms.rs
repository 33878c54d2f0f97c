use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::farm::{CreateFarm, Farm, UpdateFarm};
use services::services::{farm_access::FarmAccess, validation::validate_farm};
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

fn farm_name_taken(err: sqlx::Error) -> ApiError {
    if err.as_database_error().is_some_and(|e| e.is_unique_violation()) {
        ApiError::Conflict("a farm with this name already exists".to_string())
    } else {
        err.into()
    }
}

pub async fn list_farms(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<Farm>>>, ApiError> {
    let farms = Farm::find_by_user_id(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(farms)))
}

pub async fn create_farm(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut payload): Json<CreateFarm>,
) -> Result<ResponseJson<ApiResponse<Farm>>, ApiError> {
    validate_farm(&mut payload)?;
    let farm = Farm::create(&state.db().pool, user.id, &payload, Uuid::new_v4())
        .await
        .map_err(farm_name_taken)?;
    info!(farm_id = %farm.id, user_id = %user.id, "Created farm");
    Ok(ResponseJson(ApiResponse::success(farm)))
}

pub async fn get_farm(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Farm>>, ApiError> {
    let farm = FarmAccess::require(&state.db().pool, user.id, farm_id).await?;
    Ok(ResponseJson(ApiResponse::success(farm)))
}

pub async fn update_farm(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Json(mut payload): Json<UpdateFarm>,
) -> Result<ResponseJson<ApiResponse<Farm>>, ApiError> {
    validate_farm(&mut payload)?;
    let farm = Farm::update(&state.db().pool, farm_id, user.id, &payload)
        .await
        .map_err(farm_name_taken)?
        .ok_or(ApiError::NotFound("farm"))?;
    Ok(ResponseJson(ApiResponse::success(farm)))
}

pub async fn delete_farm(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows = Farm::delete(&state.db().pool, farm_id, user.id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound("farm"));
    }
    info!(farm_id = %farm_id, user_id = %user.id, "Deleted farm");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/farms", get(list_farms).post(create_farm))
        .route(
            "/farms/{farm_id}",
            get(get_farm).put(update_farm).delete(delete_farm),
        )
}
