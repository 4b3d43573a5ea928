//! Construction heuristics producing the initial feasible solution each
//! search seed starts from.

mod basic;
mod dynamic;
mod init_routes;

use crate::problem::{
    job::{JobIdx, JobType},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{
    deadline::Deadline,
    eval::{eval_insert, eval_insert_pair},
    insertion::Insertion,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
    solver_params::{Heuristic, HeuristicParams, Init, Sort},
};

pub fn construct(
    problem: &VehicleRoutingProblem,
    solution: &mut SolutionState,
    params: &HeuristicParams,
    deadline: &Deadline,
) {
    match params.heuristic {
        Heuristic::Basic => {
            seed_routes(problem, solution, params.init, params.sort, deadline);
            basic::run(problem, solution, deadline);
        }
        Heuristic::Dynamic => {
            seed_routes(problem, solution, params.init, params.sort, deadline);
            dynamic::run(problem, solution, params.regret_coeff, deadline);
        }
        Heuristic::InitRoutes => {
            init_routes::apply_forced_routes(problem, solution);
            basic::run(problem, solution, deadline);
        }
    }
}

/// Plants one seed job in each empty vehicle according to the init policy,
/// visiting vehicles in the order the sort dictates. Ties break by job id.
fn seed_routes(
    problem: &VehicleRoutingProblem,
    solution: &mut SolutionState,
    init: Init,
    sort: Sort,
    deadline: &Deadline,
) {
    if init == Init::None {
        return;
    }

    let mut order: Vec<RouteIdx> = (0..solution.route_count()).map(RouteIdx::new).collect();
    match sort {
        Sort::Availability => order.sort_by_key(|&r| {
            let v = problem.vehicle(r.as_vehicle());
            (std::cmp::Reverse(v.tw().length()), v.id())
        }),
        Sort::Cost => order.sort_by_key(|&r| {
            let costs = problem.vehicle(r.as_vehicle()).costs();
            (costs.fixed, costs.per_hour, costs.per_km, problem.vehicle(r.as_vehicle()).id())
        }),
    }

    for route_id in order {
        if deadline.expired() {
            return;
        }
        if !solution.route(route_id).is_empty() {
            continue;
        }

        let mut best: Option<(SeedKey, Insertion)> = None;
        for job_idx in solution.unassigned_sorted() {
            let job = problem.job(job_idx);
            let placement = match job.job_type() {
                JobType::Single => eval_insert(problem, solution.route(route_id), job_idx, 0).map(
                    |_| Insertion::Single {
                        route: route_id,
                        job: job_idx,
                        rank: 0,
                    },
                ),
                JobType::Pickup => {
                    let pair = problem.shipment(job.shipment().expect("paired pickup"));
                    eval_insert_pair(
                        problem,
                        solution.route(route_id),
                        pair.pickup,
                        pair.delivery,
                        0,
                        0,
                    )
                    .map(|_| Insertion::Pair {
                        route: route_id,
                        pickup: pair.pickup,
                        delivery: pair.delivery,
                        pickup_rank: 0,
                        delivery_rank: 0,
                    })
                }
                JobType::Delivery => None,
            };

            if let Some(insertion) = placement {
                let key = seed_key(problem, route_id, job_idx, init);
                if best.is_none() || key < best.as_ref().unwrap().0 {
                    best = Some((key, insertion));
                }
            }
        }

        if let Some((_, insertion)) = best {
            insertion.commit(solution);
        }
    }
}

/// Ordering key per init policy, smaller first; the trailing id breaks ties
/// deterministically.
type SeedKey = (i64, u64);

fn seed_key(
    problem: &VehicleRoutingProblem,
    route: RouteIdx,
    job_idx: JobIdx,
    init: Init,
) -> SeedKey {
    let job = problem.job(job_idx);
    let vehicle = problem.vehicle(route.as_vehicle());
    let primary = match init {
        Init::None => 0,
        // Largest demand first.
        Init::HigherAmount => -job.amount_key().iter().sum::<i64>(),
        Init::Nearest => match vehicle.start() {
            Some(start) => problem.travel(route.as_vehicle()).duration(start, job.location()),
            None => 0,
        },
        Init::Furthest => match vehicle.start() {
            Some(start) => -problem.travel(route.as_vehicle()).duration(start, job.location()),
            None => 0,
        },
        Init::EarliestDeadline => job.tws().last().end,
    };
    (primary, job.id())
}
