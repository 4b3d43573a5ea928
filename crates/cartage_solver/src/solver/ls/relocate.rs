use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::{eval_insert, eval_remove},
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **Relocate**
///
/// Moves one single job from a route to a position in another route.
///
/// ```text
/// BEFORE:  A: ... (p) -> [job] -> (n) ...      B: ... (x) -> (y) ...
/// AFTER:   A: ... (p) -> (n) ...               B: ... (x) -> [job] -> (y) ...
/// ```
#[derive(Debug, Clone)]
pub struct RelocateOperator {
    pub from_route: RouteIdx,
    pub from_rank: usize,
    pub job: JobIdx,
    pub to_route: RouteIdx,
    pub to_rank: usize,
    pub delta: Eval,
}

impl LocalSearchOperator for RelocateOperator {
    const NAME: &'static str = "Relocate";

    fn generate_moves<C>(
        problem: &VehicleRoutingProblem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 == r2 {
            return;
        }
        let from = solution.route(r1);
        let to = solution.route(r2);

        for from_rank in 0..from.len() {
            let job = from.job_at(from_rank);
            if problem.job(job).shipment().is_some() || solution.is_fixed(job) {
                continue;
            }
            let Some(removal) = eval_remove(problem, from, from_rank, 1) else {
                continue;
            };

            for to_rank in 0..=to.len() {
                if let Some(insertion) = eval_insert(problem, to, job, to_rank) {
                    consumer(RelocateOperator {
                        from_route: r1,
                        from_rank,
                        job,
                        to_route: r2,
                        to_rank,
                        delta: removal + insertion,
                    });
                }
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let from = solution.route(self.from_route);
        let to = solution.route(self.to_route);
        if self.from_rank >= from.len()
            || from.job_at(self.from_rank) != self.job
            || self.to_rank > to.len()
        {
            return false;
        }

        match (
            eval_remove(problem, from, self.from_rank, 1),
            eval_insert(problem, to, self.job, self.to_rank),
        ) {
            (Some(removal), Some(insertion)) => removal + insertion == self.delta,
            _ => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        solution
            .route_mut(self.from_route)
            .remove(problem, self.from_rank, 1);
        solution
            .route_mut(self.to_route)
            .insert(problem, self.to_rank, self.job);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.from_route, self.to_route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn two_route_solution() -> SolutionState {
        let problem = test_utils::corridor_problem(5, 2, 100);
        let mut solution = SolutionState::new(problem);
        solution.insert_job(RouteIdx::new(0), 0, JobIdx::new(0));
        solution.insert_job(RouteIdx::new(0), 1, JobIdx::new(1));
        solution.insert_job(RouteIdx::new(1), 0, JobIdx::new(2));
        solution.insert_job(RouteIdx::new(1), 1, JobIdx::new(3));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<RelocateOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<RelocateOperator> = None;
        RelocateOperator::generate_moves(
            &problem,
            solution,
            (RouteIdx::new(0), RouteIdx::new(1)),
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
        let mut solution = two_route_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("relocate candidates exist");
        assert!(op.is_valid(&problem, &solution));

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        assert!(solution.route(op.from_route).rank_of(op.job).is_none());
        assert_eq!(solution.route(op.to_route).job_at(op.to_rank), op.job);
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = two_route_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("relocate candidates exist");
        op.apply(&problem, &mut solution);

        RelocateOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(1)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
