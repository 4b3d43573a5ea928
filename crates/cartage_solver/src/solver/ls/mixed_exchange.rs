use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_exchange,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **MixedExchange**
///
/// Swaps a two-step segment of the first route with a single step of the
/// second. Directional, so both route orders generate moves.
#[derive(Debug, Clone)]
pub struct MixedExchangeOperator {
    pub route_a: RouteIdx,
    pub rank_a: usize,
    pub segment_a: [JobIdx; 2],
    pub route_b: RouteIdx,
    pub rank_b: usize,
    pub single_b: JobIdx,
    pub delta: Eval,
}

impl LocalSearchOperator for MixedExchangeOperator {
    const NAME: &'static str = "MixedExchange";

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
        let a = solution.route(r1);
        let b = solution.route(r2);
        if a.len() < 2 || b.is_empty() {
            return;
        }

        for rank_a in 0..=a.len() - 2 {
            if !solution.segment_is_movable(r1, rank_a, rank_a + 2)
                || !a.segment_is_self_contained(problem, rank_a, rank_a + 2)
            {
                continue;
            }
            for rank_b in 0..b.len() {
                let single = b.job_at(rank_b);
                if problem.job(single).shipment().is_some() || solution.is_fixed(single) {
                    continue;
                }
                if let Some((delta_a, delta_b)) =
                    eval_exchange(problem, a, rank_a, 2, b, rank_b, 1)
                {
                    consumer(MixedExchangeOperator {
                        route_a: r1,
                        rank_a,
                        segment_a: [a.job_at(rank_a), a.job_at(rank_a + 1)],
                        route_b: r2,
                        rank_b,
                        single_b: single,
                        delta: delta_a + delta_b,
                    });
                }
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let a = solution.route(self.route_a);
        let b = solution.route(self.route_b);
        if self.rank_a + 2 > a.len()
            || self.rank_b >= b.len()
            || a.jobs()[self.rank_a..self.rank_a + 2] != self.segment_a
            || b.job_at(self.rank_b) != self.single_b
        {
            return false;
        }

        match eval_exchange(problem, a, self.rank_a, 2, b, self.rank_b, 1) {
            Some((delta_a, delta_b)) => delta_a + delta_b == self.delta,
            None => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        solution.route_mut(self.route_a).replace(
            problem,
            self.rank_a,
            self.rank_a + 2,
            &[self.single_b],
        );
        solution.route_mut(self.route_b).replace(
            problem,
            self.rank_b,
            self.rank_b + 1,
            &self.segment_a,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route_a, self.route_b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn segment_and_single_solution() -> SolutionState {
        let problem = test_utils::corridor_problem(4, 2, 100);
        let mut solution = SolutionState::new(problem);
        solution.insert_job(RouteIdx::new(0), 0, JobIdx::new(0));
        solution.insert_job(RouteIdx::new(0), 1, JobIdx::new(1));
        solution.insert_job(RouteIdx::new(1), 0, JobIdx::new(2));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<MixedExchangeOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<MixedExchangeOperator> = None;
        MixedExchangeOperator::generate_moves(
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
        let mut solution = segment_and_single_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("mixed-exchange candidates exist");
        assert!(op.is_valid(&problem, &solution));

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        assert_eq!(solution.route(op.route_a).jobs(), &[op.single_b]);
        assert_eq!(
            &solution.route(op.route_b).jobs()[op.rank_b..op.rank_b + 2],
            &op.segment_a[..]
        );
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = segment_and_single_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("mixed-exchange candidates exist");
        op.apply(&problem, &mut solution);

        // The roles flipped: route 1 now holds the segment.
        MixedExchangeOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(1), RouteIdx::new(0)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
