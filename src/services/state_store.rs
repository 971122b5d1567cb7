//! Driver state store: two Redis-backed keys per driver (the full
//! DriverState document and a short-lived last-GPS fix), degrading to
//! no-ops whenever Redis is unreachable.

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::defaults::DRIVER_STATE_KEY_PREFIX;
use crate::types::{DriverState, GpsFix};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LastGps {
    lat: f64,
    lng: f64,
    timestamp: DateTime<Utc>,
}

pub struct DriverStateStore {
    redis: Option<ConnectionManager>,
    state_ttl_seconds: u64,
    gps_ttl_seconds: u64,
}

impl DriverStateStore {
    pub fn new(redis: Option<ConnectionManager>, state_ttl_seconds: u64, gps_ttl_seconds: u64) -> Self {
        Self { redis, state_ttl_seconds, gps_ttl_seconds }
    }

    fn state_key(driver_id: &str) -> String {
        format!("{DRIVER_STATE_KEY_PREFIX}:{driver_id}:state")
    }

    fn gps_key(driver_id: &str) -> String {
        format!("{DRIVER_STATE_KEY_PREFIX}:{driver_id}:last_gps")
    }

    /// Serialize and save, refreshing the state document's TTL.
    pub async fn save(&self, state: &DriverState) {
        let Some(mut conn) = self.redis.clone() else { return };
        let Ok(serialized) = serde_json::to_string(state) else {
            warn!(driver_id = %state.driver_id, "failed to serialize driver state");
            return;
        };
        let result: redis::RedisResult<()> = redis::cmd("SET")
            .arg(Self::state_key(&state.driver_id))
            .arg(serialized)
            .arg("EX")
            .arg(self.state_ttl_seconds)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            warn!(driver_id = %state.driver_id, error = %e, "driver state save failed, continuing without persistence");
        }
    }

    pub async fn get(&self, driver_id: &str) -> Option<DriverState> {
        let mut conn = self.redis.clone()?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::state_key(driver_id))
            .query_async(&mut conn)
            .await
            .inspect_err(|e| warn!(%driver_id, error = %e, "driver state read failed, treating as not found"))
            .ok()
            .flatten();
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    /// Writes the short-TTL GPS key unconditionally, then patches
    /// `last_gps` into the state document if present, preserving its
    /// existing TTL rather than resetting it.
    pub async fn update_gps(&self, driver_id: &str, lat: f64, lng: f64, timestamp: DateTime<Utc>) {
        let Some(mut conn) = self.redis.clone() else { return };

        let fix = LastGps { lat, lng, timestamp };
        if let Ok(serialized) = serde_json::to_string(&fix) {
            let result: redis::RedisResult<()> = redis::cmd("SET")
                .arg(Self::gps_key(driver_id))
                .arg(serialized)
                .arg("EX")
                .arg(self.gps_ttl_seconds)
                .query_async(&mut conn)
                .await;
            if let Err(e) = result {
                warn!(%driver_id, error = %e, "last-gps write failed");
            }
        }

        let key = Self::state_key(driver_id);
        let ttl: redis::RedisResult<i64> = redis::cmd("TTL").arg(&key).query_async(&mut conn).await;
        let Ok(ttl) = ttl else { return };
        if ttl <= 0 {
            return;
        }

        if let Some(mut state) = self.get(driver_id).await {
            state.last_gps = Some(GpsFix { lat, lng, timestamp });
            if let Ok(serialized) = serde_json::to_string(&state) {
                let result: redis::RedisResult<()> = redis::cmd("SET")
                    .arg(&key)
                    .arg(serialized)
                    .arg("EX")
                    .arg(ttl)
                    .query_async(&mut conn)
                    .await;
                if let Err(e) = result {
                    warn!(%driver_id, error = %e, "driver state patch (last_gps) failed");
                }
            }
        }
    }

    /// Idempotent: adding the same stop id twice is a no-op. Absent
    /// state document is a logged no-op, never fatal.
    pub async fn mark_completed(&self, driver_id: &str, stop_id: &str) {
        let Some(mut state) = self.get(driver_id).await else {
            warn!(%driver_id, %stop_id, "mark_completed on missing driver state, ignoring");
            return;
        };
        state.mark_completed(stop_id);
        self.save(&state).await;
    }

    pub async fn clear(&self, driver_id: &str) {
        let Some(mut conn) = self.redis.clone() else { return };
        let result: redis::RedisResult<()> = redis::cmd("DEL")
            .arg(Self::state_key(driver_id))
            .arg(Self::gps_key(driver_id))
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            warn!(%driver_id, error = %e, "driver state clear failed");
        }
    }
}
