use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_reverse,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **IntraTwoOpt**
///
/// Reverses a job segment of one route, the classical 2-opt edge swap.
#[derive(Debug, Clone)]
pub struct IntraTwoOptOperator {
    pub route: RouteIdx,
    pub start: usize,
    pub end: usize,
    pub first: JobIdx,
    pub last: JobIdx,
    pub delta: Eval,
}

impl LocalSearchOperator for IntraTwoOptOperator {
    const NAME: &'static str = "IntraTwoOpt";

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

        for start in 0..route.len() {
            for end in start + 1..route.len() {
                if !solution.segment_is_movable(r1, start, end + 1) {
                    continue;
                }
                if let Some(delta) = eval_reverse(problem, route, start, end) {
                    consumer(IntraTwoOptOperator {
                        route: r1,
                        start,
                        end,
                        first: route.job_at(start),
                        last: route.job_at(end),
                        delta,
                    });
                }
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let route = solution.route(self.route);
        if self.end >= route.len()
            || route.job_at(self.start) != self.first
            || route.job_at(self.end) != self.last
        {
            return false;
        }
        eval_reverse(problem, route, self.start, self.end) == Some(self.delta)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        solution
            .route_mut(self.route)
            .reverse(problem, self.start, self.end);
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

    fn crossed_solution() -> SolutionState {
        let problem = test_utils::corridor_problem(5, 1, 100);
        let mut solution = SolutionState::new(problem);
        let route = RouteIdx::new(0);
        solution.insert_job(route, 0, JobIdx::new(0));
        solution.insert_job(route, 1, JobIdx::new(2));
        solution.insert_job(route, 2, JobIdx::new(1));
        solution.insert_job(route, 3, JobIdx::new(3));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<IntraTwoOptOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<IntraTwoOptOperator> = None;
        IntraTwoOptOperator::generate_moves(
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
        let mut solution = crossed_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("reversals exist");
        assert!(op.is_valid(&problem, &solution));
        assert!(op.delta.cost < 0);

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        // The segment bounds swapped ends.
        assert_eq!(solution.route(op.route).job_at(op.start), op.last);
        assert_eq!(solution.route(op.route).job_at(op.end), op.first);
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = crossed_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("reversals exist");
        op.apply(&problem, &mut solution);

        IntraTwoOptOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
