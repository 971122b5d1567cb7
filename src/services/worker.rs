//! GPS worker: the side-effectful re-routing sequence (§4.7), dispatched
//! one bounded task per driver so frames for the same driver never
//! interleave. Drivers run fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::services::distance_matrix::CachedMatrixProvider;
use crate::services::pipeline::Pipeline;
use crate::services::state_store::DriverStateStore;
use crate::services::{pubsub, trigger, vrp};
use crate::types::ServerFrame;

#[derive(Debug, Clone)]
pub struct GpsUpdate {
    pub driver_id: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
    pub completed_stop_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerResult {
    pub rerouted: bool,
    pub reason: String,
}

impl WorkerResult {
    fn no(reason: &str) -> Self {
        Self { rerouted: false, reason: reason.to_string() }
    }
}

/// Shared dependencies for a single GPS update's processing. Cheap to
/// clone: everything inside is a connection handle or `Arc`.
#[derive(Clone)]
pub struct WorkerContext {
    pub state_store: Arc<DriverStateStore>,
    pub matrix_provider: Arc<CachedMatrixProvider>,
    pub redis: Option<redis::aio::ConnectionManager>,
    pub config: Arc<Config>,
}

/// Runs the full §4.7 sequence for one GPS frame.
pub async fn process_gps_update(ctx: &WorkerContext, update: GpsUpdate) -> WorkerResult {
    ctx.state_store
        .update_gps(&update.driver_id, update.lat, update.lng, update.timestamp)
        .await;

    let Some(mut state) = ctx.state_store.get(&update.driver_id).await else {
        return WorkerResult::no("no_state");
    };

    if let Some(stop_id) = &update.completed_stop_id {
        ctx.state_store.mark_completed(&update.driver_id, stop_id).await;
        state = match ctx.state_store.get(&update.driver_id).await {
            Some(reloaded) => reloaded,
            None => return WorkerResult::no("no_state"),
        };
        state.stops_changed = true;
    }

    let (should_reroute, reason) = trigger::evaluate(&state, update.timestamp, &ctx.config);
    if !should_reroute {
        ctx.state_store.save(&state).await;
        return WorkerResult::no("");
    }

    let remaining = state.remaining_stops();
    if remaining.is_empty() {
        ctx.state_store.save(&state).await;
        return WorkerResult::no("no_remaining_stops");
    }

    let remaining_stops: Vec<crate::types::Stop> = remaining
        .iter()
        .map(|optimized| crate::types::Stop {
            stop_id: optimized.stop_id.clone(),
            location: optimized.location,
            earliest_pickup: 0,
            latest_pickup: 1439,
            service_time_minutes: 10,
        })
        .collect();

    let driver_location = crate::types::Location::new(update.lat, update.lng);
    let solver_config = vrp::SolverConfig::new(ctx.config.max_optimization_seconds as u32, 3000);
    let pipeline = Pipeline::new(&ctx.matrix_provider, solver_config);
    let response = match pipeline
        .optimize(&update.driver_id, driver_location, &remaining_stops, update.timestamp)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(driver_id = %update.driver_id, error = %e, "re-optimization failed");
            ctx.state_store.save(&state).await;
            return WorkerResult::no("optimization_failed");
        }
    };

    state.current_route = response.optimized_stops.clone();
    state.remaining_duration = response.total_duration_minutes;
    state.last_reroute_timestamp = Some(update.timestamp);
    state.stops_changed = false;
    ctx.state_store.save(&state).await;

    let frame = ServerFrame::RouteUpdated {
        reason: reason.to_string(),
        optimized_stops: response.optimized_stops,
        total_duration_minutes: response.total_duration_minutes,
        google_maps_url: response.google_maps_url,
    };
    pubsub::publish_route_updated(&ctx.redis, &update.driver_id, &frame).await;

    info!(driver_id = %update.driver_id, reason, "driver re-routed");
    WorkerResult { rerouted: true, reason: reason.to_string() }
}

const QUEUE_CAPACITY: usize = 32;

/// Lazily-spawned, per-driver serialized dispatch. One bounded `mpsc`
/// task per `driver_id`; idle tasks are torn down when their sender is
/// dropped by every caller.
pub struct GpsDispatcher {
    ctx: WorkerContext,
    tasks: Mutex<HashMap<String, mpsc::Sender<GpsUpdate>>>,
}

impl GpsDispatcher {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx, tasks: Mutex::new(HashMap::new()) }
    }

    /// Enqueue a GPS frame for `driver_id`, spawning its worker task on
    /// first use. Does not wait for processing to complete.
    pub fn enqueue(self: &Arc<Self>, update: GpsUpdate) {
        let driver_id = update.driver_id.clone();
        let sender = {
            let mut tasks = self.tasks.lock();
            match tasks.get(&driver_id) {
                Some(tx) if !tx.is_closed() => tx.clone(),
                _ => {
                    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
                    tasks.insert(driver_id.clone(), tx.clone());
                    spawn_worker(self.ctx.clone(), rx);
                    tx
                }
            }
        };

        if sender.try_send(update).is_err() {
            warn!(%driver_id, "GPS update queue full or closed, dropping frame");
        }
    }
}

fn spawn_worker(ctx: WorkerContext, mut rx: mpsc::Receiver<GpsUpdate>) {
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            process_gps_update(&ctx, update).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Arc<Config> {
        Arc::new(Config {
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
        })
    }

    #[tokio::test]
    async fn missing_state_returns_no_state() {
        let ctx = WorkerContext {
            state_store: Arc::new(DriverStateStore::new(None, 43200, 300)),
            matrix_provider: Arc::new(CachedMatrixProvider::new(
                Box::new(crate::services::distance_matrix::MockMatrixProvider::default()),
                None,
                1800,
            )),
            redis: None,
            config: config(),
        };
        let update = GpsUpdate {
            driver_id: "ghost".to_string(),
            lat: 50.0,
            lng: 14.0,
            timestamp: Utc::now(),
            completed_stop_id: None,
        };
        let result = process_gps_update(&ctx, update).await;
        assert_eq!(result, WorkerResult::no("no_state"));
    }
}
