//! Client/server WebSocket frame types for `/ws/driver/{driver_id}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OptimizedStop;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    GpsUpdate {
        lat: Option<f64>,
        lng: Option<f64>,
        timestamp: Option<DateTime<Utc>>,
        completed_stop_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    RouteUpdated {
        reason: String,
        optimized_stops: Vec<OptimizedStop>,
        total_duration_minutes: f64,
        google_maps_url: String,
    },
}
