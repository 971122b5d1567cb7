//! Live per-driver shift state, held in the keyed store between GPS
//! updates and re-optimizations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::OptimizedStop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Active,
    Completed,
    Idle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverState {
    pub driver_id: String,
    pub current_route: Vec<OptimizedStop>,
    pub completed_stop_ids: HashSet<String>,
    pub last_gps: Option<GpsFix>,
    pub remaining_duration: f64,
    pub original_remaining_duration: f64,
    pub schedule_delay_minutes: f64,
    pub last_reroute_timestamp: Option<DateTime<Utc>>,
    pub stops_changed: bool,
    pub status: DriverStatus,
}

impl DriverState {
    pub fn new(driver_id: impl Into<String>) -> Self {
        Self {
            driver_id: driver_id.into(),
            current_route: Vec::new(),
            completed_stop_ids: HashSet::new(),
            last_gps: None,
            remaining_duration: 0.0,
            original_remaining_duration: 0.0,
            schedule_delay_minutes: 0.0,
            last_reroute_timestamp: None,
            stops_changed: false,
            status: DriverStatus::Active,
        }
    }

    /// Stops still owed a visit: the current route minus whatever has
    /// already been marked completed.
    pub fn remaining_stops(&self) -> Vec<&OptimizedStop> {
        self.current_route
            .iter()
            .filter(|s| !self.completed_stop_ids.contains(&s.stop_id))
            .collect()
    }

    /// Idempotent: marking an already-completed stop is a no-op.
    pub fn mark_completed(&mut self, stop_id: &str) {
        self.completed_stop_ids.insert(stop_id.to_string());
    }
}
