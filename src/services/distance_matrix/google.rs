//! Distance-matrix provider client, modeled on the Google Distance
//! Matrix API response shape: a flat `rows[i].elements[j]` grid with a
//! per-cell `status`, `duration` and optional `duration_in_traffic`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::MatrixProvider;
use crate::error::AppError;
use crate::types::{Location, MatrixBundle, SENTINEL_COST};

#[derive(Debug, Clone)]
pub struct GoogleMatrixConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

pub struct GoogleMatrixProvider {
    client: Client,
    config: GoogleMatrixConfig,
}

impl GoogleMatrixProvider {
    pub fn new(config: GoogleMatrixConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("failed to build distance-matrix HTTP client");
        Self { client, config }
    }

    fn waypoints_param(locations: &[Location]) -> String {
        locations
            .iter()
            .map(|l| format!("{},{}", l.lat, l.lng))
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[async_trait]
impl MatrixProvider for GoogleMatrixProvider {
    async fn fetch_matrix(
        &self,
        locations: &[Location],
        departure_time: DateTime<Utc>,
    ) -> Result<MatrixBundle, AppError> {
        let n = locations.len();
        if n == 0 {
            return Ok(MatrixBundle::empty());
        }
        if n == 1 {
            return Ok(MatrixBundle::new(vec![vec![0]], vec![vec![0]]));
        }

        let waypoints = Self::waypoints_param(locations);
        debug!(count = n, "requesting distance matrix from provider");

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("origins", waypoints.as_str()),
                ("destinations", waypoints.as_str()),
                ("key", self.config.api_key.as_str()),
                ("departure_time", &departure_time.timestamp().to_string()),
                ("traffic_model", "best_guess"),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let parsed: MatrixResponse = response
            .json()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("malformed provider response: {e}")))?;

        if parsed.status != "OK" {
            return Err(AppError::ProviderUnavailable(format!(
                "provider status {}",
                parsed.status
            )));
        }

        if parsed.rows.len() != n {
            return Err(AppError::ProviderUnavailable(
                "provider returned wrong matrix dimensions".to_string(),
            ));
        }

        let mut distances = vec![vec![0u64; n]; n];
        let mut durations = vec![vec![0u64; n]; n];

        for (i, row) in parsed.rows.iter().enumerate() {
            if row.elements.len() != n {
                return Err(AppError::ProviderUnavailable(
                    "provider returned wrong row width".to_string(),
                ));
            }
            for (j, element) in row.elements.iter().enumerate() {
                if i == j {
                    continue;
                }
                if element.status != "OK" {
                    distances[i][j] = SENTINEL_COST;
                    durations[i][j] = SENTINEL_COST;
                    continue;
                }
                distances[i][j] = element.distance.map(|d| d.value).unwrap_or(SENTINEL_COST);
                durations[i][j] = element
                    .duration_in_traffic
                    .or(element.duration)
                    .map(|d| d.value)
                    .unwrap_or(SENTINEL_COST);
            }
        }

        Ok(MatrixBundle::new(distances, durations))
    }

    fn name(&self) -> &str {
        "GoogleDistanceMatrix"
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<ValueField>,
    duration: Option<ValueField>,
    duration_in_traffic: Option<ValueField>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: u64,
}
