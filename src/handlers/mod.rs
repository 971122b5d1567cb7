//! HTTP/WebSocket handlers and the shared application state they run
//! against.

pub mod health;
pub mod optimize;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use redis::aio::ConnectionManager;
use redis::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::distance_matrix::CachedMatrixProvider;
use crate::services::state_store::DriverStateStore;
use crate::services::worker::GpsDispatcher;
use crate::services::vrp::SolverConfig;
use ws::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub matrix_provider: Arc<CachedMatrixProvider>,
    pub state_store: Arc<DriverStateStore>,
    pub dispatcher: Arc<GpsDispatcher>,
    pub solver_config: SolverConfig,
    pub redis_manager: Option<ConnectionManager>,
    pub redis_client: Option<Client>,
    pub sessions: Arc<SessionRegistry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/optimize-route", post(optimize::optimize_route))
        .route("/api/v1/health", get(health::health_check))
        .route("/ws/driver/:driver_id", get(ws::handle_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
