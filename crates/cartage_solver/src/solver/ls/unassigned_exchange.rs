use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_swap_job,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **UnassignedExchange**
///
/// Swaps an assigned job out for an unassigned one of at least equal
/// priority, re-inserting the newcomer at any position of the same route.
/// Pure priority gains go through PriorityReplace during recovery; in the
/// descent loop this move only fires when it also cuts cost.
#[derive(Debug, Clone)]
pub struct UnassignedExchangeOperator {
    pub route: RouteIdx,
    pub out_rank: usize,
    pub out_job: JobIdx,
    pub in_job: JobIdx,
    pub to_gap: usize,
    pub delta: Eval,
}

impl LocalSearchOperator for UnassignedExchangeOperator {
    const NAME: &'static str = "UnassignedExchange";

    fn generate_moves<C>(
        problem: &VehicleRoutingProblem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 != r2 {
            return;
        }
        let route = solution.route(r1);
        if route.is_empty() {
            return;
        }

        for in_job in solution.unassigned_sorted() {
            if problem.job(in_job).shipment().is_some() {
                continue;
            }
            let in_priority = problem.job(in_job).priority();

            for out_rank in 0..route.len() {
                let out_job = route.job_at(out_rank);
                if solution.is_fixed(out_job)
                    || problem.job(out_job).shipment().is_some()
                    || problem.job(out_job).priority() > in_priority
                {
                    continue;
                }

                for to_gap in 0..=route.len() {
                    if let Some(delta) = eval_swap_job(problem, route, out_rank, in_job, to_gap) {
                        consumer(UnassignedExchangeOperator {
                            route: r1,
                            out_rank,
                            out_job,
                            in_job,
                            to_gap,
                            delta,
                        });
                    }
                }
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let route = solution.route(self.route);
        if self.out_rank >= route.len()
            || route.job_at(self.out_rank) != self.out_job
            || self.to_gap > route.len()
            || !solution.is_unassigned(self.in_job)
        {
            return false;
        }
        eval_swap_job(problem, route, self.out_rank, self.in_job, self.to_gap)
            == Some(self.delta)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        apply_job_swap(
            problem,
            solution,
            self.route,
            self.out_rank,
            self.in_job,
            self.to_gap,
        );
        solution.mark_assigned(self.in_job);
        solution.mark_unassigned(self.out_job);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route]
    }
}

/// Commits a remove-one-insert-one rearrangement through the same span
/// replacement the evaluator priced, so break slots stay aligned.
pub(super) fn apply_job_swap(
    problem: &VehicleRoutingProblem,
    solution: &mut SolutionState,
    route_id: RouteIdx,
    out_rank: usize,
    in_job: JobIdx,
    to_gap: usize,
) {
    let route = solution.route_mut(route_id);
    if to_gap <= out_rank {
        let mut replacement = Vec::with_capacity(out_rank + 1 - to_gap);
        replacement.push(in_job);
        replacement.extend_from_slice(&route.jobs()[to_gap..out_rank].to_vec());
        route.replace(problem, to_gap, out_rank + 1, &replacement);
    } else {
        let mut replacement = route.jobs()[out_rank + 1..to_gap].to_vec();
        replacement.push(in_job);
        route.replace(problem, out_rank, to_gap, &replacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn solution_with_leftover() -> SolutionState {
        // Equal priorities; the assigned job sits at the far rank while a
        // cheaper one waits unassigned.
        let problem = test_utils::problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "end_index": 0, "capacity": [1]}],
                "jobs": [
                    {"id": 1, "location_index": 3, "delivery": [1]},
                    {"id": 2, "location_index": 1, "delivery": [1]}
                ],
                "matrix": [
                    [0, 100, 200, 300],
                    [100, 0, 100, 200],
                    [200, 100, 0, 100],
                    [300, 200, 100, 0]
                ]
            }"#,
        );
        let mut solution = SolutionState::new(problem);
        solution.insert_job(RouteIdx::new(0), 0, JobIdx::new(0));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<UnassignedExchangeOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<UnassignedExchangeOperator> = None;
        UnassignedExchangeOperator::generate_moves(
            &problem,
            solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |op| {
                if best.as_ref().map_or(true, |held| op.delta.cost < held.delta.cost) {
                    best = Some(op);
                }
            },
        );
        best
    }

    #[test]
    fn test_applied_cost_matches_delta() {
        let mut solution = solution_with_leftover();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("exchange candidates exist");
        assert!(op.is_valid(&problem, &solution));
        // Swapping the far job for the near one cuts travel.
        assert!(op.delta.cost < 0);

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        assert!(solution.route(op.route).rank_of(op.in_job).is_some());
        assert!(solution.is_unassigned(op.out_job));
        assert!(!solution.is_unassigned(op.in_job));
    }

    #[test]
    fn test_stale_move_is_rejected() {
        let mut solution = solution_with_leftover();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("exchange candidates exist");
        op.apply(&problem, &mut solution);

        // The newcomer is assigned now, so the captured move is stale.
        assert!(!op.is_valid(&problem, &solution));
    }
}
