//! `GET /api/v1/health` — liveness plus a quick look at the two things
//! that can degrade: the Redis connection and the provider API key.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    redis: &'static str,
    maps_api: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let redis = match &state.redis_manager {
        Some(manager) => {
            let mut conn = manager.clone();
            let result: redis::RedisResult<String> =
                redis::cmd("PING").query_async(&mut conn).await;
            match result {
                Ok(_) => "ok",
                Err(_) => "unavailable",
            }
        }
        None => "unavailable",
    };

    let maps_api = if state.config.maps_api_key.is_some() { "configured" } else { "missing" };

    Json(HealthResponse { status: "healthy", redis, maps_api })
}
