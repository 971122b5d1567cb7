//! Stop type: a pickup the driver must visit within a time window.

use serde::{Deserialize, Serialize};

use super::Location;

/// A stop to visit, identified by an opaque id. No protected health
/// information travels through this type — `stop_id` is meaningless to
/// this service beyond round-tripping it back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: String,
    pub location: Location,
    /// Minutes since midnight.
    pub earliest_pickup: u32,
    /// Minutes since midnight.
    pub latest_pickup: u32,
    pub service_time_minutes: u32,
}

impl Stop {
    pub fn validate(&self) -> Result<(), String> {
        if !self.location.is_valid() {
            return Err(format!("stop {} has an invalid location", self.stop_id));
        }
        if self.earliest_pickup >= self.latest_pickup {
            return Err(format!(
                "stop {} has earliest_pickup >= latest_pickup",
                self.stop_id
            ));
        }
        if self.service_time_minutes < 1 || self.service_time_minutes > 60 {
            return Err(format!(
                "stop {} has service_time_minutes out of [1, 60]",
                self.stop_id
            ));
        }
        Ok(())
    }
}
