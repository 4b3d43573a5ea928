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

/// **CrossExchange**
///
/// Swaps a two-step segment of one route with a two-step segment of another.
/// Symmetric, so only generated for ordered route pairs.
#[derive(Debug, Clone)]
pub struct CrossExchangeOperator {
    pub route_a: RouteIdx,
    pub rank_a: usize,
    pub segment_a: [JobIdx; 2],
    pub route_b: RouteIdx,
    pub rank_b: usize,
    pub segment_b: [JobIdx; 2],
    pub delta: Eval,
}

impl LocalSearchOperator for CrossExchangeOperator {
    const NAME: &'static str = "CrossExchange";

    fn generate_moves<C>(
        problem: &VehicleRoutingProblem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 >= r2 {
            return;
        }
        let a = solution.route(r1);
        let b = solution.route(r2);
        if a.len() < 2 || b.len() < 2 {
            return;
        }

        for rank_a in 0..=a.len() - 2 {
            if !solution.segment_is_movable(r1, rank_a, rank_a + 2)
                || !a.segment_is_self_contained(problem, rank_a, rank_a + 2)
            {
                continue;
            }
            for rank_b in 0..=b.len() - 2 {
                if !solution.segment_is_movable(r2, rank_b, rank_b + 2)
                    || !b.segment_is_self_contained(problem, rank_b, rank_b + 2)
                {
                    continue;
                }
                if let Some((delta_a, delta_b)) =
                    eval_exchange(problem, a, rank_a, 2, b, rank_b, 2)
                {
                    consumer(CrossExchangeOperator {
                        route_a: r1,
                        rank_a,
                        segment_a: [a.job_at(rank_a), a.job_at(rank_a + 1)],
                        route_b: r2,
                        rank_b,
                        segment_b: [b.job_at(rank_b), b.job_at(rank_b + 1)],
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
            || self.rank_b + 2 > b.len()
            || a.jobs()[self.rank_a..self.rank_a + 2] != self.segment_a
            || b.jobs()[self.rank_b..self.rank_b + 2] != self.segment_b
        {
            return false;
        }

        match eval_exchange(problem, a, self.rank_a, 2, b, self.rank_b, 2) {
            Some((delta_a, delta_b)) => delta_a + delta_b == self.delta,
            None => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        solution.route_mut(self.route_a).replace(
            problem,
            self.rank_a,
            self.rank_a + 2,
            &self.segment_b,
        );
        solution.route_mut(self.route_b).replace(
            problem,
            self.rank_b,
            self.rank_b + 2,
            &self.segment_a,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route_a, self.route_b]
    }
}
