use serde::Serialize;

use crate::problem::{
    amount::Amount,
    scale::{scale_to_user_duration, Duration, UserDuration, INFINITE_COST},
    vehicle_routing_problem::VehicleRoutingProblem,
};
use crate::solver::solution::route::{Route, Step};

/// Closed set of reportable constraint breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    LeadTime,
    Delay,
    Load,
    MaxTasks,
    Skills,
    Precedence,
    MissingBreak,
    MaxTravelTime,
    MaxLoad,
    MaxDistance,
}

#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub cause: ViolationKind,
    /// Earliness or lateness in user seconds, for the time-shaped causes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<UserDuration>,
}

impl Violation {
    fn of(cause: ViolationKind) -> Self {
        Violation {
            cause,
            duration: None,
        }
    }

    fn timed(cause: ViolationKind, excess: Duration) -> Self {
        Violation {
            cause,
            duration: Some(scale_to_user_duration(excess.max(0))),
        }
    }
}

/// Re-checks one route from scratch against every invariant and enumerates
/// the breaches. This is independent of the route's cached envelopes, so it
/// also covers user-forced layouts the search was not allowed to repair.
pub fn check_route(problem: &VehicleRoutingProblem, route: &Route) -> Vec<Violation> {
    let mut violations = Vec::new();
    if route.is_empty() {
        for _ in route.missing_breaks() {
            violations.push(Violation::of(ViolationKind::MissingBreak));
        }
        return violations;
    }

    let vehicle = route.vehicle(problem);
    let travel = problem.travel(route.vehicle_idx());
    let capacity = vehicle.capacity();

    if route.len() > vehicle.max_tasks() {
        violations.push(Violation::of(ViolationKind::MaxTasks));
    }
    if route.travel_eval().duration > vehicle.max_travel_time() {
        violations.push(Violation::timed(
            ViolationKind::MaxTravelTime,
            route.travel_eval().duration - vehicle.max_travel_time(),
        ));
    }
    if route.travel_eval().distance > vehicle.max_distance() {
        violations.push(Violation::of(ViolationKind::MaxDistance));
    }
    for _ in route.missing_breaks() {
        violations.push(Violation::of(ViolationKind::MissingBreak));
    }

    // Skills and shipment precedence.
    for &job_idx in route.jobs() {
        let job = problem.job(job_idx);
        if !vehicle.can_serve(job) {
            violations.push(Violation::of(ViolationKind::Skills));
        }
        if job.is_pickup() {
            let partner = problem
                .matching_partner(job_idx)
                .expect("pickup has a delivery");
            match route.rank_of(partner) {
                Some(partner_rank) => {
                    if partner_rank < route.rank_of(job_idx).unwrap_or(0) {
                        violations.push(Violation::of(ViolationKind::Precedence));
                    }
                }
                None => violations.push(Violation::of(ViolationKind::Precedence)),
            }
        }
        if job.is_delivery() {
            let partner = problem
                .matching_partner(job_idx)
                .expect("delivery has a pickup");
            if route.rank_of(partner).is_none() {
                violations.push(Violation::of(ViolationKind::Precedence));
            }
        }
    }

    // Load profile along the job sequence, plus break load caps.
    let mut load = route.initial_load().clone();
    check_load(&load, capacity, &mut violations);
    for rank in 0..route.len() {
        let job = problem.job(route.job_at(rank));
        load -= job.delivery();
        load += job.pickup();
        check_load(&load, capacity, &mut violations);
    }
    for &(b, gap) in route.break_gaps() {
        if !problem.break_at(b).load_is_admissible(route.load_at(gap)) {
            violations.push(Violation::of(ViolationKind::MaxLoad));
        }
    }

    // Independent time sweep over the step sequence.
    let mut t = vehicle.tw().start;
    let mut prev_loc = vehicle.start();
    let service_type = vehicle.service_type();
    for &step in route.steps() {
        match step {
            Step::Job(j) => {
                let job = problem.job(j);
                let leg = match prev_loc {
                    Some(from) => travel.duration(from, job.location()),
                    None => 0,
                };
                if leg >= INFINITE_COST {
                    continue;
                }
                let arrival = t + leg;
                let setup = if prev_loc == Some(job.location()) {
                    0
                } else {
                    job.setup()
                };
                let ready = arrival + setup;
                let start = match job.tws().earliest_start_from(ready) {
                    Some(start) => start,
                    None => {
                        violations.push(Violation::timed(
                            ViolationKind::Delay,
                            job.tws().delay_at(ready),
                        ));
                        ready
                    }
                };
                t = start + job.service_for(service_type);
                prev_loc = Some(job.location());
            }
            Step::Break(b) => {
                let br = problem.break_at(b);
                let start = match br.tws().earliest_start_from(t) {
                    Some(start) => start,
                    None => {
                        violations.push(Violation::timed(
                            ViolationKind::Delay,
                            br.tws().delay_at(t),
                        ));
                        t
                    }
                };
                t = start + br.service();
            }
        }
    }
    if let (Some(end), Some(from)) = (vehicle.end(), prev_loc) {
        let leg = travel.duration(from, end);
        if leg < INFINITE_COST {
            t += leg;
        }
    }
    if t > vehicle.tw().end {
        violations.push(Violation::timed(ViolationKind::Delay, t - vehicle.tw().end));
    }

    violations
}

fn check_load(load: &Amount, capacity: &Amount, violations: &mut Vec<Violation>) {
    if !load.fits_in(capacity) {
        violations.push(Violation::of(ViolationKind::Load));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{job::JobIdx, vehicle::VehicleIdx};
    use crate::solver::solution::route::Route;
    use crate::test_utils;

    fn causes(violations: &[Violation]) -> Vec<ViolationKind> {
        violations.iter().map(|v| v.cause).collect()
    }

    #[test]
    fn test_feasible_route_reports_nothing() {
        let problem = test_utils::problem(&test_utils::line_problem_json(10, 2));
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));
        route.insert(&problem, 1, JobIdx::new(1));

        assert!(check_route(&problem, &route).is_empty());
    }

    #[test]
    fn test_overload_and_task_bound() {
        let problem = test_utils::problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "capacity": [1], "max_tasks": 1}],
                "jobs": [
                    {"id": 1, "location_index": 1, "delivery": [1]},
                    {"id": 2, "location_index": 1, "delivery": [1]}
                ],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        );
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));
        route.insert(&problem, 1, JobIdx::new(1));

        let found = causes(&check_route(&problem, &route));
        assert!(found.contains(&ViolationKind::Load));
        assert!(found.contains(&ViolationKind::MaxTasks));
    }

    #[test]
    fn test_missed_window_reports_delay() {
        let problem = test_utils::problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0}],
                "jobs": [{"id": 1, "location_index": 1, "time_windows": [[0, 100]]}],
                "matrix": [[0, 300], [300, 0]]
            }"#,
        );
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));

        let violations = check_route(&problem, &route);
        assert_eq!(causes(&violations), vec![ViolationKind::Delay]);
        // Arrival at 300 s against a window closing at 100 s.
        assert_eq!(violations[0].duration, Some(200));
    }

    #[test]
    fn test_skill_mismatch_reports_skills() {
        let problem = test_utils::problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "skills": [1]}],
                "jobs": [{"id": 1, "location_index": 1, "skills": [2]}],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        );
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));

        assert_eq!(
            causes(&check_route(&problem, &route)),
            vec![ViolationKind::Skills]
        );
    }

    #[test]
    fn test_lone_shipment_half_reports_precedence() {
        let problem = test_utils::problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "capacity": [1]}],
                "shipments": [{
                    "amount": [1],
                    "pickup": {"id": 10, "location_index": 1},
                    "delivery": {"id": 11, "location_index": 1}
                }],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        );
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));

        let found = causes(&check_route(&problem, &route));
        assert!(found.contains(&ViolationKind::Precedence));
    }
}
