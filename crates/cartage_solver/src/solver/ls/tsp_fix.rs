use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_replace,
    ls::r#move::LocalSearchOperator,
    solution::route::Route,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **TSPFix**
///
/// Re-sequences one route towards its TSP order under the fixed assignment:
/// nearest-neighbor construction from the vehicle start, then 2-opt passes
/// to a local optimum on pure travel cost. The re-sequenced order is only
/// offered when the full evaluation (windows, loads, bounds) accepts it.
#[derive(Debug, Clone)]
pub struct TspFixOperator {
    pub route: RouteIdx,
    pub order: Vec<JobIdx>,
    pub delta: Eval,
}

fn tsp_order(problem: &VehicleRoutingProblem, route: &Route) -> Vec<JobIdx> {
    let travel = problem.travel(route.vehicle_idx());
    let vehicle = route.vehicle(problem);

    let mut remaining: Vec<JobIdx> = route.jobs().to_vec();
    let mut order: Vec<JobIdx> = Vec::with_capacity(remaining.len());

    // Nearest neighbor, seeded from the vehicle start when it has one.
    let mut current = vehicle.start();
    while !remaining.is_empty() {
        let next = match current {
            Some(from) => remaining
                .iter()
                .enumerate()
                .min_by_key(|(_, &job)| {
                    (travel.cost(from, problem.job(job).location()), problem.job(job).id())
                })
                .map(|(i, _)| i)
                .unwrap_or(0),
            None => 0,
        };
        let job = remaining.remove(next);
        current = Some(problem.job(job).location());
        order.push(job);
    }

    // 2-opt passes on pure travel cost until no swap improves.
    let leg = |from: Option<JobIdx>, to: Option<JobIdx>| {
        let from_loc = match from {
            Some(job) => Some(problem.job(job).location()),
            None => vehicle.start(),
        };
        let to_loc = match to {
            Some(job) => Some(problem.job(job).location()),
            None => vehicle.end(),
        };
        match (from_loc, to_loc) {
            (Some(a), Some(b)) => travel.cost(a, b),
            _ => 0,
        }
    };

    let n = order.len();
    let mut improved = true;
    while improved {
        improved = false;
        for i in 0..n {
            for j in i + 1..n {
                let before_i = if i == 0 { None } else { Some(order[i - 1]) };
                let after_j = if j + 1 == n { None } else { Some(order[j + 1]) };

                let current_cost = leg(before_i, Some(order[i])) + leg(Some(order[j]), after_j);
                let reversed_cost = leg(before_i, Some(order[j])) + leg(Some(order[i]), after_j);
                if reversed_cost < current_cost {
                    order[i..=j].reverse();
                    improved = true;
                }
            }
        }
    }

    order
}

impl LocalSearchOperator for TspFixOperator {
    const NAME: &'static str = "TSPFix";

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
        if route.len() < 3
            || !solution.segment_is_movable(r1, 0, route.len())
            || !route.segment_has_no_shipments(problem, 0, route.len())
        {
            return;
        }

        let order = tsp_order(problem, route);
        if order == route.jobs() {
            return;
        }

        if let Some(delta) = eval_replace(problem, route, 0, route.len(), order.iter().copied()) {
            consumer(TspFixOperator {
                route: r1,
                order,
                delta,
            });
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let route = solution.route(self.route);
        if self.order.len() != route.len() {
            return false;
        }
        eval_replace(problem, route, 0, route.len(), self.order.iter().copied())
            == Some(self.delta)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        solution
            .route_mut(self.route)
            .replace(problem, 0, self.order.len(), &self.order);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route]
    }
}
