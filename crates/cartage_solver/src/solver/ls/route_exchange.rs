use crate::problem::{
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_replace,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **RouteExchange**
///
/// Swaps the full job sequences of two vehicles. Pays off when the vehicles
/// differ in cost model, window or start point.
#[derive(Debug, Clone)]
pub struct RouteExchangeOperator {
    pub route_a: RouteIdx,
    pub route_b: RouteIdx,
    pub delta: Eval,
}

impl LocalSearchOperator for RouteExchangeOperator {
    const NAME: &'static str = "RouteExchange";

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
        if a.is_empty() && b.is_empty() {
            return;
        }
        if !solution.segment_is_movable(r1, 0, a.len())
            || !solution.segment_is_movable(r2, 0, b.len())
        {
            return;
        }

        let delta_a = eval_replace(problem, a, 0, a.len(), b.jobs().iter().copied());
        let delta_b = eval_replace(problem, b, 0, b.len(), a.jobs().iter().copied());
        if let (Some(delta_a), Some(delta_b)) = (delta_a, delta_b) {
            consumer(RouteExchangeOperator {
                route_a: r1,
                route_b: r2,
                delta: delta_a + delta_b,
            });
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let a = solution.route(self.route_a);
        let b = solution.route(self.route_b);
        let delta_a = eval_replace(problem, a, 0, a.len(), b.jobs().iter().copied());
        let delta_b = eval_replace(problem, b, 0, b.len(), a.jobs().iter().copied());
        match (delta_a, delta_b) {
            (Some(delta_a), Some(delta_b)) => delta_a + delta_b == self.delta,
            _ => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let jobs_a = solution.route(self.route_a).jobs().to_vec();
        let jobs_b = solution.route(self.route_b).jobs().to_vec();

        let len_a = jobs_a.len();
        let len_b = jobs_b.len();
        solution
            .route_mut(self.route_a)
            .replace(problem, 0, len_a, &jobs_b);
        solution
            .route_mut(self.route_b)
            .replace(problem, 0, len_b, &jobs_a);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route_a, self.route_b]
    }
}
