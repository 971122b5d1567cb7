//! `POST /api/v1/optimize-route` — plans a fresh route for a driver
//! and their stop list.

use axum::extract::State;
use axum::Json;
use tracing::info;

use super::AppState;
use crate::error::AppError;
use crate::services::pipeline::Pipeline;
use crate::types::{OptimizeRequest, OptimizeResponse};

pub async fn optimize_route(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, AppError> {
    request
        .validate()
        .map_err(AppError::ValidationError)?;

    if request.stops.len() > state.config.max_stops_per_route {
        return Err(AppError::ValidationError(format!(
            "stop count {} exceeds the per-route maximum of {}",
            request.stops.len(),
            state.config.max_stops_per_route
        )));
    }

    if request.is_departure_in_past(chrono::Utc::now()) {
        return Err(AppError::ValidationError(
            "departure_time must not be in the past".to_string(),
        ));
    }

    let pipeline = Pipeline::new(&state.matrix_provider, state.solver_config.clone());
    let response = pipeline
        .optimize(&request.driver_id, request.driver_location, &request.stops, request.departure_time)
        .await?;

    info!(driver_id = %request.driver_id, stops = request.stops.len(), score = response.optimization_score, "route optimized");
    Ok(Json(response))
}
