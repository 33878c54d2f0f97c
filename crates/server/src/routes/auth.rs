use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::User;
use services::services::auth::{AuthResponse, LoginRequest, RegisterRequest};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, extract::AuthUser};

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let response = state.auth().register(payload).await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let response = state.auth().login(payload).await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = state.auth().current_user(user.id).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/me", get(me)),
    )
}
