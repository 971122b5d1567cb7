//! Pipeline orchestrator: ties the distance-matrix cache, the VRPTW
//! solver and the route assembler into the single entry point used by
//! both the optimize-route handler and the GPS worker's re-route path.

use chrono::{DateTime, Timelike, Utc};

use crate::error::AppError;
use crate::services::assembler;
use crate::services::distance_matrix::CachedMatrixProvider;
use crate::services::vrp::{self, SolverConfig};
use crate::types::{Location, MatrixBundle, OptimizeResponse, Stop};

pub struct Pipeline<'a> {
    matrix_provider: &'a CachedMatrixProvider,
    solver_config: SolverConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(matrix_provider: &'a CachedMatrixProvider, solver_config: SolverConfig) -> Self {
        Self { matrix_provider, solver_config }
    }

    pub async fn optimize(
        &self,
        driver_id: &str,
        driver_location: Location,
        stops: &[Stop],
        departure_time: DateTime<Utc>,
    ) -> Result<OptimizeResponse, AppError> {
        let mut locations = Vec::with_capacity(stops.len() + 1);
        locations.push(driver_location);
        locations.extend(stops.iter().map(|s| s.location));

        let matrices = self.matrix_provider.get_matrix(&locations, departure_time).await?;
        let naive_duration = naive_duration_minutes(&matrices, stops);

        let departure_minutes = departure_time.hour() * 60 + departure_time.minute();
        let date = departure_time.date_naive();

        let order = vrp::solve_order(stops, &matrices, date, departure_minutes, &self.solver_config)?;

        let ordered_stops: Vec<Stop> = order.iter().map(|&i| stops[i].clone()).collect();
        let reindexed = reindex_matrices(&matrices, &order);

        let mut response = assembler::assemble(driver_id, driver_location, &ordered_stops, &reindexed, departure_minutes);
        response.optimization_score = score(naive_duration, response.total_duration_minutes);
        Ok(response)
    }
}

fn naive_duration_minutes(matrices: &MatrixBundle, stops: &[Stop]) -> f64 {
    let mut total = 0i64;
    let mut prev = 0usize;
    for (i, stop) in stops.iter().enumerate() {
        let node = i + 1;
        total += (matrices.duration(prev, node) / 60) as i64 + stop.service_time_minutes as i64;
        prev = node;
    }
    total as f64
}

fn score(naive_duration: f64, optimized_duration: f64) -> f64 {
    if optimized_duration <= 0.0 {
        return 1.0;
    }
    let ratio = naive_duration / optimized_duration;
    (ratio * 100.0).round() / 100.0
}

/// Build a matrix sized `(n+1)x(n+1)` where row/col 0 stays the depot
/// and row/col *k* is `order[k-1]` from the original matrix — the
/// pipeline's mandatory re-indexing contract for the assembler.
fn reindex_matrices(matrices: &MatrixBundle, order: &[usize]) -> MatrixBundle {
    let mut full_order = Vec::with_capacity(order.len() + 1);
    full_order.push(0);
    full_order.extend(order.iter().map(|&i| i + 1));
    matrices.reorder(&full_order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reindex_matrices_maps_rows_and_cols_by_solver_order() {
        // depot=0, stops at 1,2,3. Solver visits them in order [2,0,1] (stop ids).
        let matrices = MatrixBundle::new(
            vec![
                vec![0, 1, 2, 3],
                vec![10, 0, 12, 13],
                vec![20, 21, 0, 23],
                vec![30, 31, 32, 0],
            ],
            vec![
                vec![0, 100, 200, 300],
                vec![1000, 0, 1200, 1300],
                vec![2000, 2100, 0, 2300],
                vec![3000, 3100, 3200, 0],
            ],
        );
        let order = vec![2, 0, 1];
        let reindexed = reindex_matrices(&matrices, &order);

        // new node 1 = old node 3 (order[0]+1), new node 2 = old node 1, new node 3 = old node 2
        assert_eq!(reindexed.distance(0, 1), matrices.distance(0, 3));
        assert_eq!(reindexed.distance(1, 2), matrices.distance(3, 1));
        assert_eq!(reindexed.distance(2, 3), matrices.distance(1, 2));
        assert_eq!(reindexed.distance(0, 0), matrices.distance(0, 0));
    }

    #[test]
    fn score_of_one_means_solver_matched_input_order() {
        assert_eq!(score(100.0, 100.0), 1.0);
    }

    #[test]
    fn score_above_one_means_improvement() {
        assert_eq!(score(120.0, 100.0), 1.2);
    }
}
