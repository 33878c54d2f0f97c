//! Account registration, login and bearer-token verification.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use db::models::user::{CreateUser, User};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use utils::jwt::{Claims, TokenError, TokenKeys};
use uuid::Uuid;

use super::validation::{ValidationError, normalize_email, validate_registration};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("user no longer exists")]
    UnknownUser,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(pool: SqlitePool, keys: TokenKeys) -> Self {
        Self { pool, keys }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        validate_registration(&request.email, &request.name, &request.password)?;
        let email = normalize_email(&request.email);
        if User::find_by_email(&self.pool, &email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(request.password).await?;
        let data = CreateUser {
            email,
            name: request.name.trim().to_string(),
            password_hash,
        };
        let user = match User::create(&self.pool, &data, Uuid::new_v4()).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration of the same email
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                return Err(AuthError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, "Registered user");
        let token = self.keys.issue(user.id, &user.email)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&request.email);
        let Some(user) = User::find_by_email(&self.pool, &email).await? else {
            warn!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(request.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        let token = self.keys.issue(user.id, &user.email)?;
        Ok(AuthResponse { token, user })
    }

    /// Validate a bearer token and return its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.keys.verify(token).map_err(|_| AuthError::InvalidToken)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        User::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(AuthError::UnknownUser)
    }
}

/// Runs on the blocking pool.
async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

async fn verify_password(password: String, stored_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}
