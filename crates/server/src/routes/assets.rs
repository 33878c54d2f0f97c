use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use chrono::Utc;
use db::models::asset::{Asset, AssetWithDepreciation, CreateAsset, UpdateAsset};
use services::services::{farm_access::FarmAccess, validation::validate_asset};
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

/// Assets with straight-line depreciation as of today.
pub async fn list_assets(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<AssetWithDepreciation>>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let today = Utc::now().date_naive();
    let assets = Asset::find_by_farm_id(pool, farm_id)
        .await?
        .into_iter()
        .map(|asset| asset.with_depreciation(today))
        .collect();
    Ok(ResponseJson(ApiResponse::success(assets)))
}

pub async fn create_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Json(payload): Json<CreateAsset>,
) -> Result<ResponseJson<ApiResponse<AssetWithDepreciation>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    validate_asset(&payload)?;
    let asset = Asset::create(pool, farm_id, &payload, Uuid::new_v4()).await?;
    info!(farm_id = %farm_id, asset_id = %asset.id, "Registered asset");
    Ok(ResponseJson(ApiResponse::success(
        asset.with_depreciation(Utc::now().date_naive()),
    )))
}

pub async fn update_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, asset_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateAsset>,
) -> Result<ResponseJson<ApiResponse<AssetWithDepreciation>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    validate_asset(&payload)?;
    let asset = Asset::update(pool, asset_id, farm_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("asset"))?;
    Ok(ResponseJson(ApiResponse::success(
        asset.with_depreciation(Utc::now().date_naive()),
    )))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, asset_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    if Asset::delete(pool, asset_id, farm_id).await? == 0 {
        return Err(ApiError::NotFound("asset"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/farms/{farm_id}/finance/assets",
            get(list_assets).post(create_asset),
        )
        .route(
            "/farms/{farm_id}/finance/assets/{asset_id}",
            put(update_asset).delete(delete_asset),
        )
}
