use std::sync::Arc;

use crate::json::parse_problem;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

/// Builds a frozen problem from an input document literal.
pub(crate) fn problem(json: &str) -> Arc<VehicleRoutingProblem> {
    Arc::new(parse_problem(json).expect("test problem parses"))
}

/// A two-location line with symmetric travel time `leg` seconds, one vehicle
/// looping from and to rank 0, and `jobs` single jobs at rank 1.
pub(crate) fn line_problem_json(leg: u32, jobs: usize) -> String {
    let job_entries: Vec<String> = (1..=jobs)
        .map(|id| format!(r#"{{"id": {id}, "location_index": 1}}"#))
        .collect();
    format!(
        r#"{{
            "vehicles": [{{"id": 1, "start_index": 0, "end_index": 0}}],
            "jobs": [{}],
            "matrix": [[0, {leg}], [{leg}, 0]]
        }}"#,
        job_entries.join(",")
    )
}

/// Corridor of `locations` ranks with `leg`-second legs between neighbors,
/// `vehicles` identical loops from rank 0, and one unconstrained job per
/// rank from 1 up (job id == rank).
pub(crate) fn corridor_problem(
    locations: usize,
    vehicles: usize,
    leg: u32,
) -> Arc<VehicleRoutingProblem> {
    let vehicle_entries: Vec<String> = (1..=vehicles)
        .map(|id| format!(r#"{{"id": {id}, "start_index": 0, "end_index": 0}}"#))
        .collect();
    let job_entries: Vec<String> = (1..locations)
        .map(|rank| format!(r#"{{"id": {rank}, "location_index": {rank}}}"#))
        .collect();
    problem(&format!(
        r#"{{"vehicles": [{}], "jobs": [{}], "matrix": {}}}"#,
        vehicle_entries.join(","),
        job_entries.join(","),
        corridor_matrix(locations, leg)
    ))
}

/// Grid of `n` locations where travel between ranks i and j takes
/// `|i - j| * leg` seconds, with one vehicle starting at rank 0.
pub(crate) fn corridor_matrix(n: usize, leg: u32) -> String {
    let rows: Vec<String> = (0..n)
        .map(|i| {
            let row: Vec<String> = (0..n)
                .map(|j| (i.abs_diff(j) as u32 * leg).to_string())
                .collect();
            format!("[{}]", row.join(","))
        })
        .collect();
    format!("[{}]", rows.join(","))
}
