//! Solution document per the public JSON contract: per-route ordered steps
//! with arrival, service, waiting and load data, the unassigned tasks with
//! reason codes, and an aggregate summary. All values are unscaled back to
//! user units.

use serde::Serialize;

use crate::problem::{
    amount::Amount,
    job::{JobIdx, JobType},
    scale::{scale_to_user_cost, scale_to_user_duration, Duration, Eval, UserCost, UserDuration},
    vehicle_routing_problem::VehicleRoutingProblem,
};
use crate::report::violations::{Violation, ViolationKind};
use crate::solver::solution::route::{Route, Step};
use crate::solver::solver::SolveOutcome;

#[derive(Serialize)]
pub struct SolutionDocument {
    pub code: u32,
    pub summary: Summary,
    pub routes: Vec<RouteOutput>,
    pub unassigned: Vec<UnassignedOutput>,
}

#[derive(Serialize)]
pub struct Summary {
    pub cost: UserCost,
    pub routes: usize,
    pub unassigned: usize,
    pub delivery: Vec<i64>,
    pub pickup: Vec<i64>,
    pub setup: UserDuration,
    pub service: UserDuration,
    pub duration: UserDuration,
    pub waiting_time: UserDuration,
    pub distance: i64,
    pub violations: Vec<Violation>,
    pub computing_times: ComputingTimes,
}

#[derive(Serialize)]
pub struct ComputingTimes {
    /// Milliseconds spent parsing and building the model.
    pub loading: u64,
    /// Milliseconds spent in the search itself.
    pub solving: u64,
}

#[derive(Serialize)]
pub struct RouteOutput {
    pub vehicle: u64,
    pub cost: UserCost,
    pub delivery: Vec<i64>,
    pub pickup: Vec<i64>,
    pub setup: UserDuration,
    pub service: UserDuration,
    pub duration: UserDuration,
    pub waiting_time: UserDuration,
    pub distance: i64,
    pub steps: Vec<StepOutput>,
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Serialize)]
pub struct StepOutput {
    #[serde(rename = "type")]
    pub step_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_index: Option<usize>,
    pub setup: UserDuration,
    pub service: UserDuration,
    pub waiting_time: UserDuration,
    pub arrival: UserDuration,
    /// Cumulated travel time upon arriving at this step.
    pub duration: UserDuration,
    /// Cumulated travel distance upon arriving at this step.
    pub distance: i64,
    pub load: Vec<i64>,
}

#[derive(Serialize)]
pub struct UnassignedOutput {
    pub id: u64,
    #[serde(rename = "type")]
    pub task_type: JobType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ViolationKind>,
}

pub fn solution_document(outcome: &SolveOutcome, loading_ms: u64) -> SolutionDocument {
    let solution = &outcome.solution;
    let problem = solution.problem();

    let mut routes = Vec::new();
    let mut total = Eval::ZERO;
    let mut total_setup: Duration = 0;
    let mut total_service: Duration = 0;
    let mut total_waiting: Duration = 0;
    let mut total_delivery = Amount::zeros(problem.amount_dimensions());
    let mut total_pickup = Amount::zeros(problem.amount_dimensions());
    let mut all_violations = Vec::new();

    for (route_idx, route) in solution.routes().iter().enumerate() {
        if route.is_empty() {
            continue;
        }
        let violations = outcome.route_violations[route_idx].clone();
        all_violations.extend(violations.iter().cloned());

        let output = route_output(problem, route, violations);
        total.cost += route.cost(problem);
        total.duration += route.travel_eval().duration;
        total.distance += route.travel_eval().distance;
        total_setup += route.setup_sum();
        total_service += route.service_sum();
        total_waiting += route.waiting_sum();
        for &job in route.jobs() {
            total_delivery += problem.job(job).delivery();
            total_pickup += problem.job(job).pickup();
        }
        routes.push(output);
    }

    let unassigned: Vec<UnassignedOutput> = solution
        .unassigned_sorted()
        .into_iter()
        .map(|job| unassigned_output(problem, job))
        .collect();

    SolutionDocument {
        code: 0,
        summary: Summary {
            cost: scale_to_user_cost(total.cost),
            routes: routes.len(),
            unassigned: unassigned.len(),
            delivery: total_delivery.iter().collect(),
            pickup: total_pickup.iter().collect(),
            setup: scale_to_user_duration(total_setup),
            service: scale_to_user_duration(total_service),
            duration: scale_to_user_duration(total.duration),
            waiting_time: scale_to_user_duration(total_waiting),
            distance: total.distance,
            violations: all_violations,
            computing_times: ComputingTimes {
                loading: loading_ms,
                solving: outcome.computing_time.as_millis() as u64,
            },
        },
        routes,
        unassigned,
    }
}

fn route_output(
    problem: &VehicleRoutingProblem,
    route: &Route,
    violations: Vec<Violation>,
) -> RouteOutput {
    let vehicle = route.vehicle(problem);
    let travel = problem.travel(route.vehicle_idx());

    let mut steps = Vec::with_capacity(route.steps().len() + 2);
    let mut cumulated = Eval::ZERO;
    let mut prev_loc = vehicle.start();

    if let Some(start) = vehicle.start() {
        steps.push(StepOutput {
            step_type: "start",
            id: None,
            location: problem.location(start).coordinates(),
            location_index: Some(start.get()),
            setup: 0,
            service: 0,
            waiting_time: 0,
            arrival: scale_to_user_duration(route.start_time()),
            duration: 0,
            distance: 0,
            load: route.initial_load().iter().collect(),
        });
    }

    let mut job_rank = 0usize;
    for (step_idx, &step) in route.steps().iter().enumerate() {
        let slot = route.step_schedule(step_idx);
        match step {
            Step::Job(j) => {
                let job = problem.job(j);
                if let Some(from) = prev_loc {
                    cumulated.duration += travel.duration(from, job.location());
                    cumulated.distance += travel.distance(from, job.location());
                }
                prev_loc = Some(job.location());
                job_rank += 1;

                steps.push(StepOutput {
                    step_type: match job.job_type() {
                        JobType::Single => "job",
                        JobType::Pickup => "pickup",
                        JobType::Delivery => "delivery",
                    },
                    id: Some(job.id()),
                    location: problem.location(job.location()).coordinates(),
                    location_index: Some(job.location().get()),
                    setup: scale_to_user_duration(slot.setup),
                    service: scale_to_user_duration(
                        job.service_for(vehicle.service_type()),
                    ),
                    waiting_time: scale_to_user_duration(slot.start - slot.setup - slot.arrival),
                    arrival: scale_to_user_duration(slot.arrival),
                    duration: scale_to_user_duration(cumulated.duration),
                    distance: cumulated.distance,
                    load: route.load_at(job_rank).iter().collect(),
                });
            }
            Step::Break(b) => {
                let br = problem.break_at(b);
                steps.push(StepOutput {
                    step_type: "break",
                    id: Some(br.id()),
                    location: prev_loc.and_then(|l| problem.location(l).coordinates()),
                    location_index: prev_loc.map(|l| l.get()),
                    setup: 0,
                    service: scale_to_user_duration(br.service()),
                    waiting_time: scale_to_user_duration(slot.start - slot.arrival),
                    arrival: scale_to_user_duration(slot.arrival),
                    duration: scale_to_user_duration(cumulated.duration),
                    distance: cumulated.distance,
                    load: route.load_at(job_rank).iter().collect(),
                });
            }
        }
    }

    if let Some(end) = vehicle.end() {
        if let Some(from) = prev_loc {
            cumulated.duration += travel.duration(from, end);
            cumulated.distance += travel.distance(from, end);
        }
        steps.push(StepOutput {
            step_type: "end",
            id: None,
            location: problem.location(end).coordinates(),
            location_index: Some(end.get()),
            setup: 0,
            service: 0,
            waiting_time: 0,
            arrival: scale_to_user_duration(route.end_time()),
            duration: scale_to_user_duration(cumulated.duration),
            distance: cumulated.distance,
            load: route.load_at(route.len()).iter().collect(),
        });
    }

    let mut delivery = Amount::zeros(problem.amount_dimensions());
    let mut pickup = Amount::zeros(problem.amount_dimensions());
    for &job in route.jobs() {
        delivery += problem.job(job).delivery();
        pickup += problem.job(job).pickup();
    }

    RouteOutput {
        vehicle: vehicle.id(),
        cost: scale_to_user_cost(route.cost(problem)),
        delivery: delivery.iter().collect(),
        pickup: pickup.iter().collect(),
        setup: scale_to_user_duration(route.setup_sum()),
        service: scale_to_user_duration(route.service_sum()),
        duration: scale_to_user_duration(route.travel_eval().duration),
        waiting_time: scale_to_user_duration(route.waiting_sum()),
        distance: route.travel_eval().distance,
        steps,
        violations,
        description: vehicle.description().to_owned(),
    }
}

/// Best-effort reason code for a task the search could not place.
fn unassigned_output(problem: &VehicleRoutingProblem, job_idx: JobIdx) -> UnassignedOutput {
    let job = problem.job(job_idx);

    let no_skills = problem
        .vehicles()
        .iter()
        .all(|vehicle| !vehicle.can_serve(job));
    let amount = job.amount_key();
    let no_capacity = problem
        .vehicles()
        .iter()
        .all(|vehicle| !amount.fits_in(vehicle.capacity()));
    let no_window = problem.vehicles().iter().all(|vehicle| {
        job.tws().last().end < vehicle.tw().start || vehicle.tw().end < job.tws().first().start
    });

    let reason = if no_skills {
        Some(ViolationKind::Skills)
    } else if no_capacity {
        Some(ViolationKind::Load)
    } else if no_window {
        Some(ViolationKind::Delay)
    } else {
        None
    };

    UnassignedOutput {
        id: job.id(),
        task_type: job.job_type(),
        location: problem.location(job.location()).coordinates(),
        location_index: Some(job.location().get()),
        reason,
    }
}

pub fn to_json(document: &SolutionDocument) -> String {
    serde_json::to_string_pretty(document).expect("solution document serializes")
}

#[derive(Serialize)]
pub struct ErrorDocument {
    pub code: u32,
    pub error: String,
}

impl ErrorDocument {
    pub fn new(code: u32, error: String) -> Self {
        ErrorDocument { code, error }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("error document serializes")
    }
}
