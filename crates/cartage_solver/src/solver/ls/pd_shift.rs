use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::{eval_insert_pair, eval_replace},
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **PDShift**
///
/// Moves a pickup-delivery pair as a unit from one route to another,
/// choosing fresh positions for both halves in the target.
#[derive(Debug, Clone)]
pub struct PDShiftOperator {
    pub from_route: RouteIdx,
    pub pickup_rank: usize,
    pub delivery_rank: usize,
    pub pickup: JobIdx,
    pub delivery: JobIdx,
    pub to_route: RouteIdx,
    pub to_pickup_rank: usize,
    pub to_delivery_rank: usize,
    pub delta: Eval,
}

impl PDShiftOperator {
    fn removal_delta(
        &self,
        problem: &VehicleRoutingProblem,
        solution: &SolutionState,
    ) -> Option<Eval> {
        let from = solution.route(self.from_route);
        let middle = from.jobs()[self.pickup_rank + 1..self.delivery_rank]
            .iter()
            .copied();
        eval_replace(
            problem,
            from,
            self.pickup_rank,
            self.delivery_rank + 1,
            middle,
        )
    }
}

impl LocalSearchOperator for PDShiftOperator {
    const NAME: &'static str = "PDShift";

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

        for pair in problem.shipments() {
            let (Some(pickup_rank), Some(delivery_rank)) =
                (from.rank_of(pair.pickup), from.rank_of(pair.delivery))
            else {
                continue;
            };
            if solution.is_fixed(pair.pickup) || solution.is_fixed(pair.delivery) {
                continue;
            }

            let middle = from.jobs()[pickup_rank + 1..delivery_rank].iter().copied();
            let Some(removal) =
                eval_replace(problem, from, pickup_rank, delivery_rank + 1, middle)
            else {
                continue;
            };

            for to_pickup_rank in 0..=to.len() {
                for to_delivery_rank in to_pickup_rank..=to.len() {
                    if let Some(insertion) = eval_insert_pair(
                        problem,
                        to,
                        pair.pickup,
                        pair.delivery,
                        to_pickup_rank,
                        to_delivery_rank,
                    ) {
                        consumer(PDShiftOperator {
                            from_route: r1,
                            pickup_rank,
                            delivery_rank,
                            pickup: pair.pickup,
                            delivery: pair.delivery,
                            to_route: r2,
                            to_pickup_rank,
                            to_delivery_rank,
                            delta: removal + insertion,
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
        let from = solution.route(self.from_route);
        let to = solution.route(self.to_route);
        if from.rank_of(self.pickup) != Some(self.pickup_rank)
            || from.rank_of(self.delivery) != Some(self.delivery_rank)
            || self.to_delivery_rank > to.len()
        {
            return false;
        }

        let removal = self.removal_delta(problem, solution);
        let insertion = eval_insert_pair(
            problem,
            to,
            self.pickup,
            self.delivery,
            self.to_pickup_rank,
            self.to_delivery_rank,
        );
        match (removal, insertion) {
            (Some(removal), Some(insertion)) => removal + insertion == self.delta,
            _ => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let from = solution.route_mut(self.from_route);
        let middle = from.jobs()[self.pickup_rank + 1..self.delivery_rank].to_vec();
        from.replace(problem, self.pickup_rank, self.delivery_rank + 1, &middle);

        solution.route_mut(self.to_route).insert_pair(
            problem,
            self.to_pickup_rank,
            self.pickup,
            self.to_delivery_rank,
            self.delivery,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.from_route, self.to_route]
    }
}
