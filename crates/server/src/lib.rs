use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use db::DBService;
use services::services::{auth::AuthService, config::Config};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub mod error;
pub mod extract;
pub mod routes;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    auth: AuthService,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DBService, config: Config) -> Self {
        let auth = AuthService::new(db.pool.clone(), config.token_keys());
        Self {
            db,
            auth,
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Full application router with middleware.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config());
    Router::new()
        .nest("/api", routes::router(&state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
