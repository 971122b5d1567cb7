//! Deterministic matrix provider for tests: Haversine distance scaled
//! by a road coefficient and an average speed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::MatrixProvider;
use crate::error::AppError;
use crate::services::geo::haversine_distance;
use crate::types::{Location, MatrixBundle};

pub struct MockMatrixProvider {
    road_coefficient: f64,
    average_speed_kmh: f64,
}

impl Default for MockMatrixProvider {
    fn default() -> Self {
        Self { road_coefficient: 1.3, average_speed_kmh: 40.0 }
    }
}

impl MockMatrixProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatrixProvider for MockMatrixProvider {
    async fn fetch_matrix(
        &self,
        locations: &[Location],
        _departure_time: DateTime<Utc>,
    ) -> Result<MatrixBundle, AppError> {
        let n = locations.len();
        if n == 0 {
            return Ok(MatrixBundle::empty());
        }

        let mut distances = vec![vec![0u64; n]; n];
        let mut durations = vec![vec![0u64; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let straight_km = haversine_distance(&locations[i], &locations[j]);
                    let road_m = (straight_km * self.road_coefficient * 1000.0) as u64;
                    let seconds = ((straight_km * self.road_coefficient) / self.average_speed_kmh
                        * 3600.0) as u64;
                    distances[i][j] = road_m;
                    durations[i][j] = seconds;
                }
            }
        }

        Ok(MatrixBundle::new(distances, durations))
    }

    fn name(&self) -> &str {
        "MockMatrixProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn diagonal_is_zero_and_matrix_symmetric() {
        let provider = MockMatrixProvider::new();
        let locations = vec![Location::new(50.0755, 14.4378), Location::new(49.1951, 16.6068)];
        let now = Utc::now();
        let bundle = provider.fetch_matrix(&locations, now).await.unwrap();

        assert_eq!(bundle.distance(0, 0), 0);
        assert_eq!(bundle.distance(1, 1), 0);
        assert_eq!(bundle.distance(0, 1), bundle.distance(1, 0));
        assert!(bundle.distance(0, 1) > 0);
    }

    #[tokio::test]
    async fn single_location_returns_trivial_bundle() {
        let provider = MockMatrixProvider::new();
        let bundle = provider
            .fetch_matrix(&[Location::new(50.0, 14.0)], Utc::now())
            .await
            .unwrap();
        assert_eq!(bundle.size, 1);
        assert_eq!(bundle.distance(0, 0), 0);
    }
}
