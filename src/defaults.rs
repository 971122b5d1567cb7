//! Constants shared across components that aren't configuration (they
//! don't vary by deployment, only by the service's own fixed behavior).

/// Cache-key and store key namespaces.
pub const MATRIX_CACHE_KEY_PREFIX: &str = "dm";
pub const DRIVER_STATE_KEY_PREFIX: &str = "driver";
pub const REROUTE_CHANNEL_PREFIX: &str = "reroute";

/// Allowed slack for the solver's cumulative time dimension, in minutes.
pub const SOLVER_SLACK_MINUTES: i64 = 30;

/// Capacity of the solver's cumulative time dimension: one full day.
pub const SOLVER_CAPACITY_MINUTES: i64 = 1440;
