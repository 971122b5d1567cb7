//! Configuration management

use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL, backs the matrix cache, the driver-state
    /// store and the reroute pub/sub channel.
    pub redis_url: String,

    /// Distance-matrix provider API key.
    pub maps_api_key: Option<String>,

    /// Base URL for the distance-matrix provider.
    pub maps_api_base_url: String,

    /// TTL for cached distance-matrix entries.
    pub matrix_cache_ttl_seconds: u64,

    /// Wall-clock budget given to the VRPTW solver per solve.
    pub max_optimization_seconds: u64,

    /// Upper bound on stops accepted per optimize-route request.
    pub max_stops_per_route: usize,

    /// Rule 1 threshold: schedule delay beyond which a reroute fires.
    pub delay_threshold_minutes: f64,

    /// Rule 2 threshold: remaining/original duration ratio.
    pub traffic_increase_ratio: f64,

    /// Cooldown: minimum interval between successful reroutes.
    pub min_reroute_interval_seconds: i64,

    /// TTL for the `driver:{id}:state` document.
    pub driver_state_ttl_seconds: u64,

    /// TTL for the `driver:{id}:last_gps` document.
    pub gps_ttl_seconds: u64,

    /// HTTP/WS bind address.
    pub bind_addr: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let maps_api_key = std::env::var("GOOGLE_MAPS_API_KEY").ok();

        let maps_api_base_url = std::env::var("MAPS_API_BASE_URL").unwrap_or_else(|_| {
            "https://maps.googleapis.com/maps/api/distancematrix/json".to_string()
        });

        let matrix_cache_ttl_seconds = parse_env_or("REDIS_CACHE_TTL_SECONDS", 1800)
            .context("REDIS_CACHE_TTL_SECONDS must be a valid integer")?;

        let max_optimization_seconds = parse_env_or("MAX_OPTIMIZATION_SECONDS", 10)
            .context("MAX_OPTIMIZATION_SECONDS must be a valid integer")?;

        let max_stops_per_route = parse_env_or("MAX_STOPS_PER_ROUTE", 25)
            .context("MAX_STOPS_PER_ROUTE must be a valid integer")?;

        let delay_threshold_minutes = parse_env_or("DELAY_THRESHOLD_MINUTES", 5.0)
            .context("DELAY_THRESHOLD_MINUTES must be a valid number")?;

        let traffic_increase_ratio = parse_env_or("TRAFFIC_INCREASE_RATIO", 1.20)
            .context("TRAFFIC_INCREASE_RATIO must be a valid number")?;

        let min_reroute_interval_seconds = parse_env_or("MIN_REROUTE_INTERVAL_SECONDS", 300)
            .context("MIN_REROUTE_INTERVAL_SECONDS must be a valid integer")?;

        let driver_state_ttl_seconds = parse_env_or("DRIVER_STATE_TTL_SECONDS", 43_200)
            .context("DRIVER_STATE_TTL_SECONDS must be a valid integer")?;

        let gps_ttl_seconds = parse_env_or("GPS_TTL_SECONDS", 300)
            .context("GPS_TTL_SECONDS must be a valid integer")?;

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        Ok(Self {
            redis_url,
            maps_api_key,
            maps_api_base_url,
            matrix_cache_ttl_seconds,
            max_optimization_seconds,
            max_stops_per_route,
            delay_threshold_minutes,
            traffic_increase_ratio,
            min_reroute_interval_seconds,
            driver_state_ttl_seconds,
            gps_ttl_seconds,
            bind_addr,
        })
    }
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_api_key_none_when_not_set() {
        std::env::remove_var("GOOGLE_MAPS_API_KEY");
        let config = Config::from_env().unwrap();
        assert!(config.maps_api_key.is_none());
    }

    #[test]
    fn maps_api_key_some_when_set() {
        std::env::set_var("GOOGLE_MAPS_API_KEY", "test-key");
        let config = Config::from_env().unwrap();
        assert_eq!(config.maps_api_key, Some("test-key".to_string()));
        std::env::remove_var("GOOGLE_MAPS_API_KEY");
    }

    #[test]
    fn delay_threshold_defaults_to_five() {
        std::env::remove_var("DELAY_THRESHOLD_MINUTES");
        let config = Config::from_env().unwrap();
        assert_eq!(config.delay_threshold_minutes, 5.0);
    }

    #[test]
    fn traffic_increase_ratio_uses_override() {
        std::env::set_var("TRAFFIC_INCREASE_RATIO", "1.5");
        let config = Config::from_env().unwrap();
        assert_eq!(config.traffic_increase_ratio, 1.5);
        std::env::remove_var("TRAFFIC_INCREASE_RATIO");
    }

    #[test]
    fn max_stops_defaults_to_twenty_five() {
        std::env::remove_var("MAX_STOPS_PER_ROUTE");
        let config = Config::from_env().unwrap();
        assert_eq!(config.max_stops_per_route, 25);
    }
}
