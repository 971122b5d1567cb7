//! Traffic-aware distance-matrix cache.
//!
//! Wraps a `MatrixProvider` (the external map/traffic RPC) with a Redis
//! read-through cache keyed by the coordinate set and the departure
//! hour. The provider is the only thing that can fail hard: an
//! unreachable cache degrades to "always a miss", an unreachable
//! provider has no fallback.

mod google;
mod mock;

pub use google::{GoogleMatrixConfig, GoogleMatrixProvider};
pub use mock::MockMatrixProvider;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use crate::defaults::MATRIX_CACHE_KEY_PREFIX;
use crate::error::AppError;
use crate::types::{Location, MatrixBundle};

#[async_trait]
pub trait MatrixProvider: Send + Sync {
    /// `locations[0]` is always the driver origin. Returns a bundle the
    /// same size as `locations`. Fails only when the provider itself is
    /// unreachable or rejects the request — cell-level unreachability
    /// is represented with the sentinel cost, not an error.
    async fn fetch_matrix(
        &self,
        locations: &[Location],
        departure_time: DateTime<Utc>,
    ) -> Result<MatrixBundle, AppError>;

    fn name(&self) -> &str;
}

/// Build the cache key: coordinates sorted (so permutations of the
/// same request hit the same entry) joined with the departure time
/// truncated to the hour, hashed and namespaced.
pub fn cache_key(locations: &[Location], departure_time: DateTime<Utc>) -> String {
    let mut sorted: Vec<(f64, f64)> = locations.iter().map(|l| (l.lat, l.lng)).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let truncated_hour = departure_time
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(departure_time);

    let mut payload = String::new();
    for (lat, lng) in &sorted {
        payload.push_str(&format!("{lat:.6},{lng:.6};"));
    }
    payload.push_str(&truncated_hour.to_rfc3339());

    let digest = md5::compute(payload.as_bytes());
    format!("{MATRIX_CACHE_KEY_PREFIX}:{digest:x}")
}

pub struct CachedMatrixProvider {
    inner: Box<dyn MatrixProvider>,
    redis: Option<ConnectionManager>,
    ttl_seconds: u64,
}

impl CachedMatrixProvider {
    pub fn new(inner: Box<dyn MatrixProvider>, redis: Option<ConnectionManager>, ttl_seconds: u64) -> Self {
        Self { inner, redis, ttl_seconds }
    }

    pub async fn get_matrix(
        &self,
        locations: &[Location],
        departure_time: DateTime<Utc>,
    ) -> Result<MatrixBundle, AppError> {
        let key = cache_key(locations, departure_time);

        if let Some(bundle) = self.read_cache(&key).await {
            debug!(%key, "distance-matrix cache hit");
            return Ok(bundle);
        }
        debug!(%key, "distance-matrix cache miss");

        let bundle = self.inner.fetch_matrix(locations, departure_time).await?;
        self.write_cache(&key, &bundle).await;
        Ok(bundle)
    }

    async fn read_cache(&self, key: &str) -> Option<MatrixBundle> {
        let mut conn = self.redis.clone()?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .inspect_err(|e| warn!(error = %e, "matrix cache read failed, treating as miss"))
            .ok()
            .flatten();
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    async fn write_cache(&self, key: &str, bundle: &MatrixBundle) {
        let Some(mut conn) = self.redis.clone() else { return };
        let Ok(serialized) = serde_json::to_string(bundle) else { return };
        let result: redis::RedisResult<()> = redis::cmd("SET")
            .arg(key)
            .arg(serialized)
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            warn!(error = %e, "matrix cache write failed, continuing without cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lat: f64, lng: f64) -> Location {
        Location::new(lat, lng)
    }

    #[test]
    fn cache_key_invariant_under_permutation() {
        let t = "2026-01-01T09:15:00Z".parse().unwrap();
        let a = vec![loc(50.0, 14.0), loc(49.0, 16.0)];
        let b = vec![loc(49.0, 16.0), loc(50.0, 14.0)];
        assert_eq!(cache_key(&a, t), cache_key(&b, t));
    }

    #[test]
    fn cache_key_invariant_within_hour() {
        let a = vec![loc(50.0, 14.0)];
        let t1: DateTime<Utc> = "2026-01-01T09:00:00Z".parse().unwrap();
        let t2: DateTime<Utc> = "2026-01-01T09:59:59Z".parse().unwrap();
        assert_eq!(cache_key(&a, t1), cache_key(&a, t2));
    }

    #[test]
    fn cache_key_differs_across_hour_boundary() {
        let a = vec![loc(50.0, 14.0)];
        let t1: DateTime<Utc> = "2026-01-01T09:59:59Z".parse().unwrap();
        let t2: DateTime<Utc> = "2026-01-01T10:00:00Z".parse().unwrap();
        assert_ne!(cache_key(&a, t1), cache_key(&a, t2));
    }

    #[test]
    fn cache_key_is_namespaced() {
        let a = vec![loc(50.0, 14.0)];
        let t = "2026-01-01T09:00:00Z".parse().unwrap();
        assert!(cache_key(&a, t).starts_with("dm:"));
    }
}
