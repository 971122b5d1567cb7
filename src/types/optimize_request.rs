//! Request/response types for the optimize-route endpoint and pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Location, Stop};

pub const MIN_STOPS: usize = 2;
pub const MAX_STOPS: usize = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub driver_id: String,
    pub driver_location: Location,
    pub departure_time: DateTime<Utc>,
    pub stops: Vec<Stop>,
}

impl OptimizeRequest {
    /// Validate the request against the invariants in the data model:
    /// location bounds, stop count, and per-stop windows. Does not check
    /// `departure_time` against "now" — callers compare against their
    /// own clock so this stays a pure function for testing.
    pub fn validate(&self) -> Result<(), String> {
        if !self.driver_location.is_valid() {
            return Err("driver_location is invalid".to_string());
        }
        if self.stops.len() < MIN_STOPS || self.stops.len() > MAX_STOPS {
            return Err(format!(
                "stops count must be between {MIN_STOPS} and {MAX_STOPS}, got {}",
                self.stops.len()
            ));
        }
        for stop in &self.stops {
            stop.validate()?;
        }
        Ok(())
    }

    pub fn is_departure_in_past(&self, now: DateTime<Utc>) -> bool {
        self.departure_time < now
    }
}
