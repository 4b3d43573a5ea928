use crate::problem::{
    scale::{Eval, INFINITE_COST},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    deadline::Deadline,
    insertion::{for_each_insertion, Insertion},
    solution::solution_state::SolutionState,
};

/// Per-route alternative a job was priced against while computing regret.
const MISSING_ROUTE_PENALTY: f64 = INFINITE_COST as f64;

/// Regret insertion: each round prices every unassigned job against its best
/// placement per route, scores the weighted regret (the summed gaps between
/// the per-route bests and the overall best, with routes that cannot take the
/// job at all counting as a large fixed gap), and commits the job that would
/// be most expensive to postpone. Higher priority wins ties, then lower id.
pub fn run(
    problem: &VehicleRoutingProblem,
    solution: &mut SolutionState,
    regret_coeff: f64,
    deadline: &Deadline,
) {
    loop {
        if deadline.expired() {
            return;
        }

        let mut chosen: Option<(f64, Insertion)> = None;

        for job_idx in solution.unassigned_sorted() {
            if deadline.expired() {
                return;
            }
            let mut per_route: Vec<Option<Eval>> = vec![None; solution.route_count()];
            let mut best: Option<(Eval, Insertion)> = None;

            for_each_insertion(problem, solution, job_idx, |delta, insertion| {
                let slot = &mut per_route[insertion.route().get()];
                if slot.is_none() || delta.cost < slot.unwrap().cost {
                    *slot = Some(delta);
                }
                if best.is_none() || delta.cost < best.as_ref().unwrap().0.cost {
                    best = Some((delta, insertion));
                }
            });

            let Some((best_delta, insertion)) = best else {
                continue;
            };

            let regret: f64 = regret_coeff
                * per_route
                    .iter()
                    .map(|alternative| match alternative {
                        Some(delta) => (delta.cost - best_delta.cost) as f64,
                        None => MISSING_ROUTE_PENALTY,
                    })
                    .sum::<f64>();

            let job = problem.job(job_idx);
            let replaces = match &chosen {
                None => true,
                Some((incumbent, held)) => {
                    let held_job = problem.job(held.job());
                    regret > *incumbent
                        || (regret == *incumbent
                            && (job.priority() > held_job.priority()
                                || (job.priority() == held_job.priority()
                                    && job.id() < held_job.id())))
                }
            };
            if replaces {
                chosen = Some((regret, insertion));
            }
        }

        match chosen {
            Some((_, insertion)) => insertion.commit(solution),
            None => return,
        }
    }
}
