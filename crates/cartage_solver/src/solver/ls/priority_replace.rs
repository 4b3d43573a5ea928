use crate::problem::{
    job::JobIdx,
    scale::{Eval, Priority},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_swap_job,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **PriorityReplace**
///
/// Evicts a lower-priority assigned job to make room for a higher-priority
/// unassigned one. Ranked by (priority gain, cost delta) rather than by cost
/// alone, so it runs in the recovery pass, outside the pure-cost descent.
#[derive(Debug, Clone)]
pub struct PriorityReplaceOperator {
    pub route: RouteIdx,
    pub out_rank: usize,
    pub out_job: JobIdx,
    pub in_job: JobIdx,
    pub to_gap: usize,
    pub priority_gain: Priority,
    pub delta: Eval,
}

impl LocalSearchOperator for PriorityReplaceOperator {
    const NAME: &'static str = "PriorityReplace";

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
                let out_priority = problem.job(out_job).priority();
                if solution.is_fixed(out_job)
                    || problem.job(out_job).shipment().is_some()
                    || out_priority >= in_priority
                {
                    continue;
                }

                for to_gap in 0..=route.len() {
                    if let Some(delta) = eval_swap_job(problem, route, out_rank, in_job, to_gap) {
                        consumer(PriorityReplaceOperator {
                            route: r1,
                            out_rank,
                            out_job,
                            in_job,
                            to_gap,
                            priority_gain: in_priority - out_priority,
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
        super::unassigned_exchange::apply_job_swap(
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn crowded_solution() -> SolutionState {
        let problem = test_utils::problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "capacity": [1]}],
                "jobs": [
                    {"id": 1, "location_index": 1, "delivery": [1], "priority": 10},
                    {"id": 2, "location_index": 2, "delivery": [1], "priority": 100}
                ],
                "matrix": [[0, 5, 5], [5, 0, 5], [5, 5, 0]]
            }"#,
        );
        let mut solution = SolutionState::new(problem);
        solution.insert_job(RouteIdx::new(0), 0, JobIdx::new(0));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<PriorityReplaceOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<PriorityReplaceOperator> = None;
        PriorityReplaceOperator::generate_moves(
            &problem,
            solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |op| {
                let better = best.as_ref().map_or(true, |held| {
                    (std::cmp::Reverse(op.priority_gain), op.delta.cost)
                        < (std::cmp::Reverse(held.priority_gain), held.delta.cost)
                });
                if better {
                    best = Some(op);
                }
            },
        );
        best
    }

    #[test]
    fn test_applied_cost_matches_delta() {
        let mut solution = crowded_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("an eviction exists");
        assert!(op.is_valid(&problem, &solution));
        assert_eq!(op.priority_gain, 90);

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        assert!(solution.route(op.route).rank_of(op.in_job).is_some());
        assert!(solution.is_unassigned(op.out_job));
    }

    #[test]
    fn test_never_evicts_equal_or_higher_priority() {
        let mut solution = crowded_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("an eviction exists");
        op.apply(&problem, &mut solution);

        // The high-priority job is in; the leftover cannot push it out.
        PriorityReplaceOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |_| panic!("lower priority must not evict higher"),
        );
    }
}
