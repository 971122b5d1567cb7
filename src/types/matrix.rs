//! Distance/time matrix bundle shared by the cache, solver adapter and
//! route assembler. Row/column 0 is always the driver origin.

use serde::{Deserialize, Serialize};

/// Any travel cost at or above this value is treated as unreachable.
pub const SENTINEL_COST: u64 = 999_999;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixBundle {
    /// Distance in meters, `distances[i][j]`.
    pub distances: Vec<Vec<u64>>,
    /// Duration in seconds, `durations[i][j]`.
    pub durations: Vec<Vec<u64>>,
    pub size: usize,
}

impl MatrixBundle {
    pub fn empty() -> Self {
        Self { distances: vec![], durations: vec![], size: 0 }
    }

    pub fn new(distances: Vec<Vec<u64>>, durations: Vec<Vec<u64>>) -> Self {
        let size = distances.len();
        Self { distances, durations, size }
    }

    pub fn distance(&self, from: usize, to: usize) -> u64 {
        self.distances[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> u64 {
        self.durations[from][to]
    }

    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.duration(from, to) < SENTINEL_COST && self.distance(from, to) < SENTINEL_COST
    }

    /// Re-index both matrices to a new node order. `order[k]` gives the
    /// original index that should occupy row/col `k` in the result —
    /// this is the contract the pipeline orchestrator relies on when it
    /// re-indexes the solver's output before handing it to the
    /// assembler.
    pub fn reorder(&self, order: &[usize]) -> Self {
        let n = order.len();
        let mut distances = vec![vec![0u64; n]; n];
        let mut durations = vec![vec![0u64; n]; n];
        for (i, &oi) in order.iter().enumerate() {
            for (j, &oj) in order.iter().enumerate() {
                distances[i][j] = self.distances[oi][oj];
                durations[i][j] = self.durations[oi][oj];
            }
        }
        Self { distances, durations, size: n }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> MatrixBundle {
        // 0=driver, 1=a, 2=b, 3=c
        MatrixBundle::new(
            vec![
                vec![0, 10, 20, 30],
                vec![10, 0, 15, 25],
                vec![20, 15, 0, 12],
                vec![30, 25, 12, 0],
            ],
            vec![
                vec![0, 100, 200, 300],
                vec![100, 0, 150, 250],
                vec![200, 150, 0, 120],
                vec![300, 250, 120, 0],
            ],
        )
    }

    #[test]
    fn reorder_moves_rows_and_cols_together() {
        // new order: driver(0), c(3), a(1), b(2)
        let reordered = bundle().reorder(&[0, 3, 1, 2]);
        assert_eq!(reordered.distance(0, 1), 30); // driver -> c
        assert_eq!(reordered.distance(1, 2), 25); // c -> a
        assert_eq!(reordered.distance(2, 3), 15); // a -> b
        assert_eq!(reordered.duration(0, 1), 300);
    }

    #[test]
    fn reorder_identity_is_noop() {
        let b = bundle();
        let reordered = b.reorder(&[0, 1, 2, 3]);
        assert_eq!(reordered.distances, b.distances);
        assert_eq!(reordered.durations, b.durations);
    }

    #[test]
    fn sentinel_marks_unreachable() {
        let mut b = bundle();
        b.distances[0][1] = SENTINEL_COST;
        b.durations[0][1] = SENTINEL_COST;
        assert!(!b.is_reachable(0, 1));
        assert!(b.is_reachable(0, 2));
    }
}
