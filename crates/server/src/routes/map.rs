use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::map_feature::{
    CreateMapFeature, FarmMap, MapFeature, MapFeatureKind, ReplaceFarmMap,
};
use services::services::{farm_access::FarmAccess, validation::validate_map_feature};
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

/// GET /api/farms/{farm_id}/map
pub async fn get_map(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<FarmMap>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let map = FarmMap::load(pool, farm_id).await?;
    Ok(ResponseJson(ApiResponse::success(map)))
}

/// PUT /api/farms/{farm_id}/map
/// Replace every point, line and zone of the farm at once
pub async fn replace_map(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Json(payload): Json<ReplaceFarmMap>,
) -> Result<ResponseJson<ApiResponse<FarmMap>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    for kind in MapFeatureKind::ALL {
        payload
            .features(kind)
            .iter()
            .try_for_each(validate_map_feature)?;
    }
    let map = FarmMap::replace(pool, farm_id, &payload).await?;
    info!(
        farm_id = %farm_id,
        points = map.points.len(),
        lines = map.lines.len(),
        zones = map.zones.len(),
        "Replaced farm map"
    );
    Ok(ResponseJson(ApiResponse::success(map)))
}

pub async fn list_features(
    kind: MapFeatureKind,
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<MapFeature>>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let features = MapFeature::find_by_farm_id(pool, kind, farm_id).await?;
    Ok(ResponseJson(ApiResponse::success(features)))
}

pub async fn create_feature(
    kind: MapFeatureKind,
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Json(payload): Json<CreateMapFeature>,
) -> Result<ResponseJson<ApiResponse<MapFeature>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    validate_map_feature(&payload)?;
    let feature = MapFeature::create(pool, kind, farm_id, &payload, Uuid::new_v4()).await?;
    info!(farm_id = %farm_id, feature_id = %feature.id, kind = %kind, "Created map feature");
    Ok(ResponseJson(ApiResponse::success(feature)))
}

pub async fn update_feature(
    kind: MapFeatureKind,
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, feature_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateMapFeature>,
) -> Result<ResponseJson<ApiResponse<MapFeature>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    validate_map_feature(&payload)?;
    let feature = MapFeature::update(pool, kind, feature_id, farm_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("map feature"))?;
    Ok(ResponseJson(ApiResponse::success(feature)))
}

pub async fn delete_feature(
    kind: MapFeatureKind,
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, feature_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    if MapFeature::delete(pool, kind, feature_id, farm_id).await? == 0 {
        return Err(ApiError::NotFound("map feature"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

fn feature_routes(kind: MapFeatureKind) -> Router<AppState> {
    let collection = format!("/farms/{{farm_id}}/{}", kind.plural());
    let item = format!("{collection}/{{id}}");
    Router::new()
        .route(
            &collection,
            get(
                move |state: State<AppState>, user: AuthUser, path: Path<Uuid>| {
                    list_features(kind, state, user, path)
                },
            )
            .post(
                move |state: State<AppState>,
                      user: AuthUser,
                      path: Path<Uuid>,
                      body: Json<CreateMapFeature>| {
                    create_feature(kind, state, user, path, body)
                },
            ),
        )
        .route(
            &item,
            put(
                move |state: State<AppState>,
                      user: AuthUser,
                      path: Path<(Uuid, Uuid)>,
                      body: Json<CreateMapFeature>| {
                    update_feature(kind, state, user, path, body)
                },
            )
            .delete(
                move |state: State<AppState>, user: AuthUser, path: Path<(Uuid, Uuid)>| {
                    delete_feature(kind, state, user, path)
                },
            ),
        )
}

pub fn router(_state: &AppState) -> Router<AppState> {
    let mut router = Router::new().route("/farms/{farm_id}/map", get(get_map).put(replace_map));
    for kind in MapFeatureKind::ALL {
        router = router.merge(feature_routes(kind));
    }
    router
}
