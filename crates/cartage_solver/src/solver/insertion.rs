use crate::problem::{
    job::{JobIdx, JobType},
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{
    eval::{eval_insert, eval_insert_pair},
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// A concrete placement of one task (or one shipment pair) in one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Single {
        route: RouteIdx,
        job: JobIdx,
        rank: usize,
    },
    Pair {
        route: RouteIdx,
        pickup: JobIdx,
        delivery: JobIdx,
        pickup_rank: usize,
        /// Relative to the route before either insertion.
        delivery_rank: usize,
    },
}

impl Insertion {
    pub fn route(&self) -> RouteIdx {
        match self {
            Insertion::Single { route, .. } => *route,
            Insertion::Pair { route, .. } => *route,
        }
    }

    /// Representative job: the job itself, or the pickup half of a pair.
    pub fn job(&self) -> JobIdx {
        match self {
            Insertion::Single { job, .. } => *job,
            Insertion::Pair { pickup, .. } => *pickup,
        }
    }

    pub fn commit(&self, solution: &mut SolutionState) {
        match *self {
            Insertion::Single { route, job, rank } => solution.insert_job(route, rank, job),
            Insertion::Pair {
                route,
                pickup,
                delivery,
                pickup_rank,
                delivery_rank,
            } => solution.insert_pair(route, pickup_rank, pickup, delivery_rank, delivery),
        }
    }
}

/// Calls `f` with every feasible placement of `job` across all routes, in
/// deterministic (route, rank) order. A shipment job is enumerated through
/// its pickup half; the delivery half yields nothing on its own.
pub fn for_each_insertion(
    problem: &VehicleRoutingProblem,
    solution: &SolutionState,
    job: JobIdx,
    mut f: impl FnMut(Eval, Insertion),
) {
    match problem.job(job).job_type() {
        JobType::Single => {
            for (route_idx, route) in solution.routes().iter().enumerate() {
                let route_id = RouteIdx::new(route_idx);
                for rank in 0..=route.len() {
                    if let Some(delta) = eval_insert(problem, route, job, rank) {
                        f(
                            delta,
                            Insertion::Single {
                                route: route_id,
                                job,
                                rank,
                            },
                        );
                    }
                }
            }
        }
        JobType::Pickup => {
            let shipment = problem
                .job(job)
                .shipment()
                .expect("pickup job belongs to a shipment");
            let pair = problem.shipment(shipment);

            for (route_idx, route) in solution.routes().iter().enumerate() {
                let route_id = RouteIdx::new(route_idx);
                for pickup_rank in 0..=route.len() {
                    for delivery_rank in pickup_rank..=route.len() {
                        if let Some(delta) = eval_insert_pair(
                            problem,
                            route,
                            pair.pickup,
                            pair.delivery,
                            pickup_rank,
                            delivery_rank,
                        ) {
                            f(
                                delta,
                                Insertion::Pair {
                                    route: route_id,
                                    pickup: pair.pickup,
                                    delivery: pair.delivery,
                                    pickup_rank,
                                    delivery_rank,
                                },
                            );
                        }
                    }
                }
            }
        }
        JobType::Delivery => {}
    }
}

/// Cheapest feasible placement of `job`, with deterministic first-found
/// tie-breaking over (route, rank).
pub fn best_insertion(
    problem: &VehicleRoutingProblem,
    solution: &SolutionState,
    job: JobIdx,
) -> Option<(Eval, Insertion)> {
    let mut best: Option<(Eval, Insertion)> = None;
    for_each_insertion(problem, solution, job, |delta, insertion| {
        if best.is_none() || delta.cost < best.as_ref().unwrap().0.cost {
            best = Some((delta, insertion));
        }
    });
    best
}
