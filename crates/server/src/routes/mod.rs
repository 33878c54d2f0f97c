use axum::Router;

use crate::AppState;

pub mod assets;
pub mod auth;
pub mod farms;
pub mod health;
pub mod insights;
pub mod map;
pub mod movements;
pub mod tasks;
pub mod zone_reports;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router(state))
        .merge(auth::router(state))
        .merge(farms::router(state))
        .merge(map::router(state))
        .merge(tasks::router(state))
        .merge(movements::router(state))
        .merge(assets::router(state))
        .merge(zone_reports::router(state))
        .merge(insights::router(state))
}
