use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, patch},
};
use chrono::Utc;
use db::models::task::{CreateTask, Task, TaskFilter, UpdateTask, UpdateTaskStatus};
use services::services::{
    farm_access::FarmAccess,
    task_suggestions::{TaskSuggestion, load_task_suggestions},
    validation::validate_task,
};
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AuthUser};

pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Query(filter): Query<TaskFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let tasks = Task::find_by_farm_id(pool, farm_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
    Json(mut payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    validate_task(&mut payload)?;
    let task = Task::create(pool, farm_id, &payload, Uuid::new_v4()).await?;
    info!(farm_id = %farm_id, task_id = %task.id, "Created task");
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let task = Task::find_by_id(pool, task_id, farm_id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, task_id)): Path<(Uuid, Uuid)>,
    Json(mut payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    validate_task(&mut payload)?;
    let task = Task::update(pool, task_id, farm_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, task_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTaskStatus>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let task = Task::update_status(pool, task_id, farm_id, payload.status)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    info!(task_id = %task_id, status = %task.status, "Task status changed");
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path((farm_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    if Task::delete(pool, task_id, farm_id).await? == 0 {
        return Err(ApiError::NotFound("task"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/farms/{farm_id}/tasks/suggestions
pub async fn task_suggestions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskSuggestion>>>, ApiError> {
    let pool = &state.db().pool;
    FarmAccess::require(pool, user.id, farm_id).await?;
    let today = Utc::now().date_naive();
    let suggestions = load_task_suggestions(pool, farm_id, today).await?;
    Ok(ResponseJson(ApiResponse::success(suggestions)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/farms/{farm_id}/tasks", get(list_tasks).post(create_task))
        .route("/farms/{farm_id}/tasks/suggestions", get(task_suggestions))
        .route(
            "/farms/{farm_id}/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route(
            "/farms/{farm_id}/tasks/{task_id}/status",
            patch(update_task_status),
        )
}
