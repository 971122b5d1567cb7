//! Builds vrp-pragmatic JSON input from stop windows and a matrix
//! bundle. One vehicle, one shift, absolute clock time windows pinned
//! to the departure day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use vrp_pragmatic::format::problem::Matrix;

use crate::defaults::SOLVER_CAPACITY_MINUTES;
use crate::types::{MatrixBundle, Stop};

pub const DEFAULT_PROFILE: &str = "car";
pub const VEHICLE_ID: &str = "driver_vehicle";
pub const VEHICLE_TYPE: &str = "driver";

/// Build the pragmatic problem JSON. `stops[i]` occupies matrix index
/// `i + 1` (depot is index 0). `date` anchors the absolute clock times;
/// `departure_minutes` pins the vehicle shift start (and therefore the
/// time dimension's zero point) to the requested departure instant.
pub fn build_problem(stops: &[Stop], date: NaiveDate, departure_minutes: u32) -> Value {
    let jobs: Vec<Value> = stops
        .iter()
        .enumerate()
        .map(|(index, stop)| {
            let start = format_rfc3339(date, minutes_to_time(stop.earliest_pickup));
            let end = format_rfc3339(date, minutes_to_time(stop.latest_pickup));
            json!({
                "id": stop.stop_id,
                "services": [{
                    "places": [{
                        "location": { "index": index + 1 },
                        "duration": (stop.service_time_minutes as i64) * 60,
                        "times": [[start, end]]
                    }]
                }]
            })
        })
        .collect();

    let shift_start = minutes_to_time(departure_minutes);
    let shift_end_minutes = departure_minutes as i64 + SOLVER_CAPACITY_MINUTES;
    let shift_end_date_offset = shift_end_minutes / (24 * 60);
    let shift_end_date = date + chrono::Duration::days(shift_end_date_offset);
    let shift_end = minutes_to_time((shift_end_minutes % (24 * 60)) as u32);

    json!({
        "plan": {
            "jobs": jobs
        },
        "fleet": {
            "vehicles": [{
                "typeId": VEHICLE_TYPE,
                "vehicleIds": [VEHICLE_ID],
                "profile": { "matrix": DEFAULT_PROFILE },
                "costs": {
                    "fixed": 0.0,
                    "distance": 1.0,
                    "time": 1.0
                },
                "shifts": [{
                    "start": {
                        "earliest": format_rfc3339(date, shift_start),
                        "location": { "index": 0 }
                    },
                    "end": {
                        "latest": format_rfc3339(shift_end_date, shift_end),
                        "location": { "index": 0 }
                    }
                }],
                "capacity": [1]
            }],
            "profiles": [{ "name": DEFAULT_PROFILE }]
        }
    })
}

/// Flatten a matrix bundle into vrp-pragmatic's row-major `Matrix`.
pub fn build_matrix(matrices: &MatrixBundle, profile: &str) -> Matrix {
    let size = matrices.size;
    let mut travel_times = Vec::with_capacity(size * size);
    let mut distances = Vec::with_capacity(size * size);

    for i in 0..size {
        for j in 0..size {
            travel_times.push(matrices.duration(i, j) as i64);
            distances.push(matrices.distance(i, j) as i64);
        }
    }

    Matrix { profile: Some(profile.to_string()), timestamp: None, travel_times, distances, error_codes: None }
}

fn minutes_to_time(minutes: u32) -> NaiveTime {
    let wrapped = minutes % (24 * 60);
    NaiveTime::from_hms_opt(wrapped / 60, wrapped % 60, 0).expect("minutes within a day")
}

fn format_rfc3339(date: NaiveDate, time: NaiveTime) -> String {
    let naive = NaiveDateTime::new(date, time);
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_rfc3339_opts(SecondsFormat::Secs, true)
}
