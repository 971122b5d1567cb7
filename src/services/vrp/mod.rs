//! VRPTW solver adapter. Formulates the single-vehicle problem with
//! hard time windows and a depot-pinned departure, delegates to
//! vrp-pragmatic/vrp-core, and extracts a 0-based visit order.

mod adapter;
mod config;
mod pragmatic;

pub use config::SolverConfig;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::types::{MatrixBundle, Stop};

/// Solve for a visit order. `matrices` must be sized `(n+1) x (n+1)`
/// with row/col 0 the depot. Returns a permutation of `0..stops.len()`.
pub fn solve_order(
    stops: &[Stop],
    matrices: &MatrixBundle,
    date: NaiveDate,
    departure_minutes: u32,
    config: &SolverConfig,
) -> Result<Vec<usize>, AppError> {
    pragmatic::solve(stops, matrices, date, departure_minutes, config)
        .map_err(|e| AppError::Infeasible(e.to_string()))
}
