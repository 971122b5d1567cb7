//! Output types: per-stop ETAs and the final optimize-route response.

use serde::{Deserialize, Serialize};

use super::Location;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedStop {
    pub stop_id: String,
    pub sequence: u32,
    pub location: Location,
    pub arrival_time: String,
    pub departure_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub driver_id: String,
    pub optimized_stops: Vec<OptimizedStop>,
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
    pub google_maps_url: String,
    pub optimization_score: f64,
}
