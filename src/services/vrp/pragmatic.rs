//! vrp-pragmatic solver invocation: build the problem, run the
//! metaheuristic within its configured budget, and extract a visit
//! order. Unlike the routing service this was adapted from, there is
//! no heuristic fallback on failure — an infeasible or unsolved
//! problem propagates as an error, since the caller needs to know the
//! windows genuinely cannot be satisfied rather than receive a worse
//! silently-substituted route.

use std::collections::HashMap;
use std::io::BufWriter;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use vrp_cli::extensions::solve::config::{create_builder_from_config, Config, TerminationConfig};
use vrp_core::solver::Solver;
use vrp_pragmatic::format::problem::{Matrix, PragmaticProblem, Problem};
use vrp_pragmatic::format::solution::{write_pragmatic, PragmaticOutputType, Solution as PragmaticSolution};

use super::adapter::{build_matrix, build_problem, DEFAULT_PROFILE};
use super::config::SolverConfig;
use crate::defaults::SOLVER_SLACK_MINUTES;
use crate::types::{MatrixBundle, Stop};

/// Returns, for each stop in `stops`, its 0-based position in the
/// solver's visit order (a permutation of `0..stops.len()`). Errors if
/// the solver can't produce a solution that visits every stop within
/// its window.
pub fn solve(
    stops: &[Stop],
    matrices: &MatrixBundle,
    date: NaiveDate,
    departure_minutes: u32,
    config: &SolverConfig,
) -> Result<Vec<usize>> {
    if stops.is_empty() {
        return Ok(vec![]);
    }

    let problem_json = build_problem(stops, date, departure_minutes);
    let problem_format: Problem =
        serde_json::from_value(problem_json).context("failed to build pragmatic problem")?;

    let matrix: Matrix = build_matrix(matrices, DEFAULT_PROFILE);
    let core_problem = (problem_format, vec![matrix])
        .read_pragmatic()
        .map_err(|errs| anyhow::anyhow!("failed to build core problem: {errs:?}"))?;
    let core_problem = Arc::new(core_problem);

    let solver_config = build_solver_config(core_problem.clone(), config)?;
    let solution = Solver::new(core_problem.clone(), solver_config)
        .solve()
        .context("solver produced no solution")?;

    let pragmatic = write_pragmatic_solution(core_problem.as_ref(), &solution)?;

    let unassigned_count = pragmatic.unassigned.as_ref().map(|u| u.len()).unwrap_or(0);
    if unassigned_count > 0 {
        anyhow::bail!("{unassigned_count} stop(s) could not be assigned within their windows");
    }

    let order = extract_order(stops, &pragmatic)?;
    enforce_wait_cap(stops, matrices, &order, departure_minutes)?;
    Ok(order)
}

/// vrp-pragmatic's hard time windows alone allow the solver to pick a
/// visit order that leaves the vehicle waiting idle at a stop for
/// arbitrarily long before `earliest_pickup`. Re-walk the solved order
/// with the same matrix the solver used and reject it if any stop
/// would require a wait beyond `SOLVER_SLACK_MINUTES`.
fn enforce_wait_cap(stops: &[Stop], matrices: &MatrixBundle, order: &[usize], departure_minutes: u32) -> Result<()> {
    let mut current = departure_minutes as i64;
    let mut prev_node = 0usize;
    for &idx in order {
        let stop = &stops[idx];
        let node = idx + 1;
        let travel_minutes = (matrices.duration(prev_node, node) / 60) as i64;
        let arrival = current + travel_minutes;
        let wait = (stop.earliest_pickup as i64 - arrival).max(0);
        if wait > SOLVER_SLACK_MINUTES {
            anyhow::bail!(
                "stop {} would require a {wait}-minute wait before its window opens, exceeding the {SOLVER_SLACK_MINUTES}-minute cap",
                stop.stop_id
            );
        }
        let service_start = arrival.max(stop.earliest_pickup as i64);
        current = service_start + stop.service_time_minutes as i64;
        prev_node = node;
    }
    Ok(())
}

fn build_solver_config(
    problem: Arc<vrp_core::models::Problem>,
    config: &SolverConfig,
) -> Result<
    vrp_core::rosomaxa::evolution::EvolutionConfig<
        vrp_core::solver::RefinementContext,
        vrp_core::models::GoalContext,
        vrp_core::construction::heuristics::InsertionContext,
    >,
> {
    let cli_config = Config {
        termination: Some(TerminationConfig {
            max_time: Some(config.max_time_seconds as usize),
            max_generations: Some(config.max_generations),
            variation: None,
        }),
        evolution: None,
        hyper: None,
        environment: None,
        telemetry: None,
        output: None,
    };

    let builder = create_builder_from_config(problem, Vec::new(), &cli_config)
        .map_err(|errs| anyhow::anyhow!("failed to create solver builder: {errs:?}"))?;

    builder.build().context("failed to build solver configuration")
}

fn write_pragmatic_solution(
    problem: &vrp_core::models::Problem,
    solution: &vrp_core::models::Solution,
) -> Result<PragmaticSolution> {
    let mut writer = BufWriter::new(Vec::new());
    write_pragmatic(problem, solution, PragmaticOutputType::default(), &mut writer)
        .map_err(|errs| anyhow::anyhow!("failed to serialize solution: {errs:?}"))?;

    let bytes = writer.into_inner().context("failed to flush solution writer")?;
    let json = String::from_utf8(bytes).context("solution is not valid UTF-8")?;
    serde_json::from_str(&json).context("failed to parse pragmatic solution JSON")
}

/// Walk the (single) tour from the depot and emit each non-depot
/// stop's 0-based index, in visit order.
fn extract_order(stops: &[Stop], solution: &PragmaticSolution) -> Result<Vec<usize>> {
    let mut index_by_id: HashMap<&str, usize> = HashMap::new();
    for (i, stop) in stops.iter().enumerate() {
        index_by_id.insert(stop.stop_id.as_str(), i);
    }

    let mut order = Vec::with_capacity(stops.len());
    if let Some(tour) = solution.tours.first() {
        for stop in &tour.stops {
            for activity in stop.activities() {
                if activity.activity_type == "departure" || activity.activity_type == "arrival" {
                    continue;
                }
                let job_id = activity.job_id.as_str();
                match index_by_id.get(job_id) {
                    Some(&idx) => order.push(idx),
                    None => anyhow::bail!("solution references unknown job id {job_id}"),
                }
            }
        }
    }

    if order.len() != stops.len() {
        anyhow::bail!(
            "solver visited {} of {} stops",
            order.len(),
            stops.len()
        );
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;

    fn stop(id: &str, earliest: u32, latest: u32) -> Stop {
        Stop {
            stop_id: id.to_string(),
            location: Location::new(49.0, 16.0),
            earliest_pickup: earliest,
            latest_pickup: latest,
            service_time_minutes: 20,
        }
    }

    #[test]
    fn empty_stops_returns_empty_order() {
        let bundle = MatrixBundle::new(vec![vec![0]], vec![vec![0]]);
        let order = solve(
            &[],
            &bundle,
            NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
            540,
            &SolverConfig::instant(),
        )
        .unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn single_stop_returns_trivial_order() {
        // departure 08:50 + 10min travel -> arrival 09:00, exactly the window open, no wait.
        let bundle = MatrixBundle::new(vec![vec![0, 10], vec![10, 0]], vec![vec![0, 600], vec![600, 0]]);
        let order = solve(
            &[stop("s1", 540, 600)],
            &bundle,
            NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
            530,
            &SolverConfig::instant(),
        )
        .unwrap();
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn two_stops_wide_windows_solves() {
        let bundle = MatrixBundle::new(
            vec![vec![0, 10000, 20000], vec![10000, 0, 15000], vec![20000, 15000, 0]],
            vec![vec![0, 600, 1200], vec![600, 0, 900], vec![1200, 900, 0]],
        );
        let stops = vec![stop("s1", 0, 1439), stop("s2", 0, 1439)];
        let order = solve(
            &stops,
            &bundle,
            NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
            480,
            &SolverConfig::instant(),
        )
        .unwrap();
        assert_eq!(order.len(), 2);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1]);
    }

    #[test]
    fn contradictory_windows_fail_to_solve() {
        let bundle = MatrixBundle::new(
            vec![vec![0, 10000], vec![10000, 0]],
            vec![vec![0, 7200], vec![7200, 0]],
        );
        // departure at 09:00, 2h travel, stop window closes at 08:30: unreachable in time
        let stops = vec![stop("s1", 0, 510)];
        let result = solve(
            &stops,
            &bundle,
            NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
            540,
            &SolverConfig::instant(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn wait_within_cap_is_accepted() {
        // driver arrives at minute 540, stop opens at 560: a 20-minute wait.
        let bundle = MatrixBundle::new(vec![vec![0, 100], vec![100, 0]], vec![vec![0, 0], vec![0, 0]]);
        let stops = vec![stop("s1", 560, 600)];
        assert!(enforce_wait_cap(&stops, &bundle, &[0], 540).is_ok());
    }

    #[test]
    fn wait_beyond_cap_is_rejected() {
        // driver arrives at minute 540, stop opens at 600: a 60-minute wait.
        let bundle = MatrixBundle::new(vec![vec![0, 100], vec![100, 0]], vec![vec![0, 0], vec![0, 0]]);
        let stops = vec![stop("s1", 600, 700)];
        let result = enforce_wait_cap(&stops, &bundle, &[0], 540);
        assert!(result.is_err());
    }

    #[test]
    fn no_wait_required_when_arrival_is_past_earliest() {
        let bundle = MatrixBundle::new(vec![vec![0, 100], vec![100, 0]], vec![vec![0, 1200], vec![1200, 0]]);
        let stops = vec![stop("s1", 0, 600)];
        assert!(enforce_wait_cap(&stops, &bundle, &[0], 540).is_ok());
    }
}
