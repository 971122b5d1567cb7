//! Pure re-routing trigger evaluator. No I/O, no clock reads beyond
//! what the caller supplies — easy to test exhaustively.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::types::DriverState;

pub const REASON_NONE: &str = "";
pub const REASON_TRAFFIC_DELAY: &str = "traffic_delay";
pub const REASON_STOP_MODIFIED: &str = "stop_modified";

/// Evaluate whether `state` should trigger a re-route right now.
/// Cooldown (Rule 0) suppresses every other rule when in effect.
pub fn evaluate(state: &DriverState, now: DateTime<Utc>, config: &Config) -> (bool, &'static str) {
    if let Some(last) = state.last_reroute_timestamp {
        let elapsed = (now - last).num_seconds();
        if elapsed < config.min_reroute_interval_seconds as i64 {
            return (false, REASON_NONE);
        }
    }

    if state.schedule_delay_minutes > config.delay_threshold_minutes {
        return (true, REASON_TRAFFIC_DELAY);
    }

    if state.original_remaining_duration > 0.0
        && state.remaining_duration > state.original_remaining_duration * config.traffic_increase_ratio
    {
        return (true, REASON_TRAFFIC_DELAY);
    }

    if state.stops_changed {
        return (true, REASON_STOP_MODIFIED);
    }

    (false, REASON_NONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config() -> Config {
        Config {
            redis_url: "redis://localhost".to_string(),
            maps_api_key: None,
            maps_api_base_url: "https://example.test".to_string(),
            matrix_cache_ttl_seconds: 1800,
            max_optimization_seconds: 10,
            max_stops_per_route: 25,
            delay_threshold_minutes: 5.0,
            traffic_increase_ratio: 1.20,
            min_reroute_interval_seconds: 300,
            driver_state_ttl_seconds: 43200,
            gps_ttl_seconds: 300,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }

    #[test]
    fn cooldown_suppresses_every_other_rule() {
        let config = config();
        let now = Utc::now();
        let mut state = DriverState::new("d1");
        state.last_reroute_timestamp = Some(now);
        state.schedule_delay_minutes = 999.0;
        state.stops_changed = true;
        assert_eq!(evaluate(&state, now, &config), (false, REASON_NONE));
    }

    #[test]
    fn cooldown_elapsed_allows_rule_evaluation() {
        let config = config();
        let now = Utc::now();
        let mut state = DriverState::new("d1");
        state.last_reroute_timestamp = Some(now - Duration::seconds(301));
        state.schedule_delay_minutes = 10.0;
        assert_eq!(evaluate(&state, now, &config), (true, REASON_TRAFFIC_DELAY));
    }

    #[test]
    fn schedule_delay_exactly_threshold_does_not_trigger() {
        let config = config();
        let now = Utc::now();
        let mut state = DriverState::new("d1");
        state.schedule_delay_minutes = 5.0;
        assert_eq!(evaluate(&state, now, &config), (false, REASON_NONE));
    }

    #[test]
    fn schedule_delay_just_past_threshold_triggers() {
        let config = config();
        let now = Utc::now();
        let mut state = DriverState::new("d1");
        state.schedule_delay_minutes = 5.0001;
        assert_eq!(evaluate(&state, now, &config), (true, REASON_TRAFFIC_DELAY));
    }

    #[test]
    fn traffic_ratio_exactly_threshold_does_not_trigger() {
        let config = config();
        let now = Utc::now();
        let mut state = DriverState::new("d1");
        state.original_remaining_duration = 100.0;
        state.remaining_duration = 120.0;
        assert_eq!(evaluate(&state, now, &config), (false, REASON_NONE));
    }

    #[test]
    fn traffic_ratio_just_past_threshold_triggers() {
        let config = config();
        let now = Utc::now();
        let mut state = DriverState::new("d1");
        state.original_remaining_duration = 100.0;
        state.remaining_duration = 120.01;
        assert_eq!(evaluate(&state, now, &config), (true, REASON_TRAFFIC_DELAY));
    }

    #[test]
    fn zero_baseline_never_triggers_rule_two() {
        let config = config();
        let now = Utc::now();
        let mut state = DriverState::new("d1");
        state.original_remaining_duration = 0.0;
        state.remaining_duration = 500.0;
        assert_eq!(evaluate(&state, now, &config), (false, REASON_NONE));
    }

    #[test]
    fn stops_changed_triggers_stop_modified() {
        let config = config();
        let now = Utc::now();
        let mut state = DriverState::new("d1");
        state.stops_changed = true;
        assert_eq!(evaluate(&state, now, &config), (true, REASON_STOP_MODIFIED));
    }

    #[test]
    fn quiescent_state_does_not_trigger() {
        let config = config();
        let now = Utc::now();
        let state = DriverState::new("d1");
        assert_eq!(evaluate(&state, now, &config), (false, REASON_NONE));
    }
}
