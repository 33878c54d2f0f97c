use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    auth::AuthError, farm_access::AccessError, validation::ValidationError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Database(err) if is_unique_violation(err) => {
                (StatusCode::CONFLICT, "resource already exists".to_string())
            }
            ApiError::Database(err) => {
                error!(error = %err, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::Auth(err) => match err {
                AuthError::Validation(v) => (StatusCode::BAD_REQUEST, v.to_string()),
                AuthError::EmailTaken => (StatusCode::CONFLICT, err.to_string()),
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::UnknownUser => (StatusCode::UNAUTHORIZED, err.to_string()),
                AuthError::Database(_) | AuthError::Hashing(_) | AuthError::Token(_) => {
                    error!(error = %err, "Authentication failure");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
            },
            ApiError::Access(AccessError::FarmNotFound) => {
                (StatusCode::NOT_FOUND, "farm not found".to_string())
            }
            ApiError::Access(AccessError::Database(err)) => {
                error!(error = %err, "Database error during access check");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
