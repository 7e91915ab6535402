//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: bool,
    pub cache: &'static str,
}

/// `GET /health`
pub async fn check(State(state): State<AppState>) -> Json<Health> {
    let database = state.db.health_check().await;
    let cache_up = state.cache.ping().await;

    Json(Health {
        status: if database && cache_up { "ok" } else { "degraded" },
        database,
        cache: state.cache.backend_name(),
    })
}
