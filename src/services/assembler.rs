//! Route assembler: turns a solved visit order plus a re-indexed
//! matrix bundle into per-stop ETAs and a maps URL.

use crate::clock::minutes_to_str;
use crate::types::{Location, MatrixBundle, OptimizeResponse, OptimizedStop, Stop};

const MAPS_BASE_URL: &str = "https://www.google.com/maps/dir";

/// `ordered_stops` and `matrices` must already be in visit order, with
/// matrix row/col 0 the driver origin and row/col k the k-th ordered
/// stop (the pipeline orchestrator's re-indexing contract). Sets
/// `optimization_score` to 0; the orchestrator fills it in afterward.
pub fn assemble(
    driver_id: &str,
    driver_location: Location,
    ordered_stops: &[Stop],
    matrices: &MatrixBundle,
    departure_minutes: u32,
) -> OptimizeResponse {
    let mut current = departure_minutes as i64;
    let mut prev_node = 0usize;
    let mut total_distance_m: u64 = 0;
    let mut optimized_stops = Vec::with_capacity(ordered_stops.len());

    for (k, stop) in ordered_stops.iter().enumerate() {
        let node = k + 1;
        let travel_seconds = matrices.duration(prev_node, node);
        let arrival = current + (travel_seconds / 60) as i64;
        let departure = arrival + stop.service_time_minutes as i64;
        total_distance_m += matrices.distance(prev_node, node);

        optimized_stops.push(OptimizedStop {
            stop_id: stop.stop_id.clone(),
            sequence: (k + 1) as u32,
            location: stop.location,
            arrival_time: minutes_to_str(arrival),
            departure_time: minutes_to_str(departure),
        });

        current = departure;
        prev_node = node;
    }

    let total_duration_minutes = round2((current - departure_minutes as i64) as f64);
    let total_distance_km = round2(total_distance_m as f64 / 1000.0);
    let google_maps_url = build_maps_url(driver_location, ordered_stops);

    OptimizeResponse {
        driver_id: driver_id.to_string(),
        optimized_stops,
        total_distance_km,
        total_duration_minutes,
        google_maps_url,
        optimization_score: 0.0,
    }
}

fn build_maps_url(driver_location: Location, stops: &[Stop]) -> String {
    let mut parts = vec![format!("{},{}", driver_location.lat, driver_location.lng)];
    parts.extend(stops.iter().map(|s| format!("{},{}", s.location.lat, s.location.lng)));
    format!("{MAPS_BASE_URL}/{}", parts.join("/"))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
