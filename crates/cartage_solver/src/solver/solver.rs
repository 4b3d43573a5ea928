use std::sync::{atomic::AtomicBool, Arc};
use std::time::Instant;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;
use crate::report::{self, violations::Violation};

use super::{
    construction,
    deadline::Deadline,
    ls::local_search::{recover_unassigned, LocalSearch},
    solution::solution_state::SolutionState,
    solver_params::{
        params_for_exploration_level, Heuristic, HeuristicParams, Init, SolverParams, Sort,
    },
};

#[derive(Copy, Clone, Debug)]
pub enum SolverStatus {
    Pending,
    Running,
    Completed,
}

/// Best solution found plus its final recheck, ready for serialization.
pub struct SolveOutcome {
    pub solution: SolutionState,
    pub route_violations: Vec<Vec<Violation>>,
    pub computing_time: std::time::Duration,
}

impl SolveOutcome {
    pub fn violation_count(&self) -> usize {
        report::violation_count(&self.route_violations)
    }
}

/// Search driver: fans the canonical heuristic-parameter seeds out over a
/// fixed-size thread pool, each worker owning its solution and running
/// construction, steepest descent and unassigned recovery to completion, then
/// keeps the best result by (violations, cost, seed rank).
pub struct Solver {
    problem: Arc<VehicleRoutingProblem>,
    params: SolverParams,
    status: RwLock<SolverStatus>,
    stop: Arc<AtomicBool>,
}

impl Solver {
    pub fn new(problem: VehicleRoutingProblem, params: SolverParams) -> Self {
        Solver {
            problem: Arc::new(problem),
            params,
            status: RwLock::new(SolverStatus::Pending),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn status(&self) -> SolverStatus {
        *self.status.read()
    }

    /// Cooperative cancellation: workers exit at their next deadline check
    /// and the best state reached so far is returned.
    pub fn stop(&self) {
        self.stop.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn problem(&self) -> &Arc<VehicleRoutingProblem> {
        &self.problem
    }

    pub fn solve(&self) -> SolveOutcome {
        let started = Instant::now();
        *self.status.write() = SolverStatus::Running;

        let deadline = match self.params.timeout {
            Some(timeout) => Deadline::after(timeout),
            None => Deadline::none(),
        }
        .with_stop(Arc::clone(&self.stop));

        let seeds = self.seeds();
        let threads = self.params.threads.max(1);
        debug!(seeds = seeds.len(), threads, "starting search");

        let results: Vec<WorkerResult> = if threads == 1 {
            seeds
                .iter()
                .map(|params| run_seed(&self.problem, params, &deadline))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .expect("worker pool");
            pool.install(|| {
                seeds
                    .par_iter()
                    .map(|params| run_seed(&self.problem, params, &deadline))
                    .collect()
            })
        };

        let best = results
            .into_iter()
            .enumerate()
            .min_by_key(|(rank, result)| (result.violations, result.cost, *rank))
            .expect("at least one seed runs")
            .1;

        *self.status.write() = SolverStatus::Completed;

        let route_violations = report::solution_violations(&best.solution);
        info!(
            cost = best.cost,
            unassigned = best.solution.unassigned().len(),
            violations = report::violation_count(&route_violations),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        );

        SolveOutcome {
            solution: best.solution,
            route_violations,
            computing_time: started.elapsed(),
        }
    }

    /// Seeds for this run. User-forced steps switch the whole run to the
    /// route-honoring heuristic; anything else draws from the canonical list
    /// at the configured exploration level.
    fn seeds(&self) -> Vec<HeuristicParams> {
        let forced = self
            .problem
            .vehicles()
            .iter()
            .any(|vehicle| vehicle.has_forced_steps());
        if forced {
            return vec![HeuristicParams::new(
                Heuristic::InitRoutes,
                Init::None,
                0.0,
                Sort::Availability,
            )];
        }
        params_for_exploration_level(self.params.exploration_level).to_vec()
    }
}

struct WorkerResult {
    solution: SolutionState,
    violations: usize,
    cost: i64,
}

fn run_seed(
    problem: &Arc<VehicleRoutingProblem>,
    params: &HeuristicParams,
    deadline: &Deadline,
) -> WorkerResult {
    let mut solution = SolutionState::new(Arc::clone(problem));

    construction::construct(problem, &mut solution, params, deadline);
    let applied = LocalSearch::new(solution.route_count()).run(problem, &mut solution, deadline);
    recover_unassigned(problem, &mut solution, deadline);

    let per_route = report::solution_violations(&solution);
    let violations = report::violation_count(&per_route);
    let cost = solution.total_cost();
    debug!(
        ?params.heuristic,
        applied,
        cost,
        violations,
        unassigned = solution.unassigned().len(),
        "seed finished"
    );

    WorkerResult {
        solution,
        violations,
        cost,
    }
}
