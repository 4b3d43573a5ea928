//! End-to-end scenarios exercising the full pipeline: JSON input, model
//! build, construction, descent, recovery and the output document.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cartage_solver::json::{self, output};
use cartage_solver::report::violations::ViolationKind;
use cartage_solver::solver::construction::construct;
use cartage_solver::solver::deadline::Deadline;
use cartage_solver::solver::solution::solution_state::SolutionState;
use cartage_solver::solver::solver::Solver;
use cartage_solver::solver::solver_params::{
    Heuristic, HeuristicParams, Init, Sort, SolverParams,
};

fn solve(input: &str, params: SolverParams) -> output::SolutionDocument {
    let problem = json::parse_problem(input).expect("input parses");
    let outcome = Solver::new(problem, params).solve();
    json::solution_document(&outcome, 0)
}

fn single_threaded() -> SolverParams {
    SolverParams {
        threads: 1,
        ..SolverParams::default()
    }
}

#[test]
fn trivial_round_trip_with_zero_capacity() {
    let document = solve(
        r#"{
            "vehicles": [{"id": 1, "start_index": 0, "end_index": 0, "capacity": []}],
            "jobs": [{"id": 1, "location_index": 1}],
            "matrix": [[0, 5], [5, 0]]
        }"#,
        single_threaded(),
    );

    assert_eq!(document.routes.len(), 1);
    assert_eq!(document.summary.unassigned, 0);
    assert_eq!(document.summary.duration, 10);
    assert_eq!(document.summary.cost, 10);
    assert!(document.summary.violations.is_empty());

    let job_steps: Vec<_> = document.routes[0]
        .steps
        .iter()
        .filter(|step| step.step_type == "job")
        .collect();
    assert_eq!(job_steps.len(), 1);
    assert_eq!(job_steps[0].id, Some(1));
}

#[test]
fn skill_mismatch_leaves_job_unassigned() {
    let document = solve(
        r#"{
            "vehicles": [{"id": 1, "start_index": 0, "skills": [1]}],
            "jobs": [{"id": 1, "location_index": 1, "skills": [2]}],
            "matrix": [[0, 5], [5, 0]]
        }"#,
        single_threaded(),
    );

    assert!(document.routes.is_empty());
    assert_eq!(document.summary.unassigned, 1);
    assert_eq!(document.unassigned[0].id, 1);
    assert_eq!(document.unassigned[0].reason, Some(ViolationKind::Skills));
}

#[test]
fn shipment_halves_stay_together() {
    let base = r#"{
        "vehicles": [{"id": 1, "start_index": 0, "capacity": [1], "time_window": [0, 10000]}],
        "shipments": [{
            "amount": [1],
            "pickup": {"id": 10, "location_index": 1, "time_windows": [[0, 1000]]},
            "delivery": {"id": 11, "location_index": 2, "time_windows": [[0, 2000]]}
        }],
        "matrix": [[0, 100, 200], [100, 0, 100], [200, 100, 0]]
    }"#;
    let document = solve(base, single_threaded());

    assert_eq!(document.summary.unassigned, 0);
    let ids: Vec<_> = document.routes[0]
        .steps
        .iter()
        .filter_map(|step| step.id)
        .collect();
    let pickup_pos = ids.iter().position(|&id| id == 10).expect("pickup routed");
    let delivery_pos = ids.iter().position(|&id| id == 11).expect("delivery routed");
    assert!(pickup_pos < delivery_pos);

    // Disjoint windows make the pair unservable; both halves must fall out
    // together, never one alone.
    let infeasible = r#"{
        "vehicles": [{"id": 1, "start_index": 0, "capacity": [1], "time_window": [0, 10000]}],
        "shipments": [{
            "amount": [1],
            "pickup": {"id": 10, "location_index": 1, "time_windows": [[5000, 6000]]},
            "delivery": {"id": 11, "location_index": 2, "time_windows": [[0, 1000]]}
        }],
        "matrix": [[0, 100, 200], [100, 0, 100], [200, 100, 0]]
    }"#;
    let document = solve(infeasible, single_threaded());
    assert_eq!(document.summary.unassigned, 2);
    assert!(document.routes.is_empty());
}

#[test]
fn regret_insertion_beats_greedy_lock_in() {
    // Vehicle 1 is the only one skilled for job 3 but may serve one task;
    // greedy burns that slot on the cheap job 1 and strands job 3.
    let input = r#"{
        "vehicles": [
            {"id": 1, "start_index": 0, "skills": [1], "max_tasks": 1},
            {"id": 2, "start_index": 0, "max_tasks": 2}
        ],
        "jobs": [
            {"id": 1, "location_index": 1},
            {"id": 2, "location_index": 2},
            {"id": 3, "location_index": 3, "skills": [1]}
        ],
        "matrix": [
            [0, 1, 2, 10],
            [1, 0, 2, 10],
            [2, 2, 0, 10],
            [10, 10, 10, 0]
        ]
    }"#;
    let problem = Arc::new(json::parse_problem(input).expect("input parses"));

    let mut greedy = SolutionState::new(Arc::clone(&problem));
    construct(
        &problem,
        &mut greedy,
        &HeuristicParams::new(Heuristic::Basic, Init::None, 0.0, Sort::Availability),
        &Deadline::none(),
    );
    assert_eq!(greedy.assigned_count(), 2);

    let mut regret = SolutionState::new(Arc::clone(&problem));
    construct(
        &problem,
        &mut regret,
        &HeuristicParams::new(Heuristic::Dynamic, Init::None, 1.0, Sort::Availability),
        &Deadline::none(),
    );
    assert_eq!(regret.assigned_count(), 3);
}

#[test]
fn deadline_bounds_wall_time_on_large_instance() {
    let jobs: Vec<String> = (1..=500)
        .map(|id| format!(r#"{{"id": {id}, "location_index": {}}}"#, id % 100 + 1))
        .collect();
    let mut matrix_rows = Vec::with_capacity(101);
    for i in 0..101usize {
        let row: Vec<String> = (0..101usize)
            .map(|j| (i.abs_diff(j) * 7).to_string())
            .collect();
        matrix_rows.push(format!("[{}]", row.join(",")));
    }
    let input = format!(
        r#"{{
            "vehicles": [
                {{"id": 1, "start_index": 0}},
                {{"id": 2, "start_index": 0}}
            ],
            "jobs": [{}],
            "matrix": [{}]
        }}"#,
        jobs.join(","),
        matrix_rows.join(",")
    );

    let problem = json::parse_problem(&input).expect("input parses");
    let params = SolverParams {
        threads: 1,
        exploration_level: 0,
        timeout: Some(Duration::from_millis(10)),
    };

    let started = Instant::now();
    let outcome = Solver::new(problem, params).solve();
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_millis(50),
        "solver took {elapsed:?}"
    );
    // Still a consistent, serializable solution, assigned or not.
    let document = json::solution_document(&outcome, 0);
    assert_eq!(
        document.summary.unassigned + document.routes.iter().map(|r| r.steps.iter().filter(|s| s.id.is_some()).count()).sum::<usize>(),
        500
    );
}

#[test]
fn priority_replace_evicts_lower_priority() {
    let document = solve(
        r#"{
            "vehicles": [{"id": 1, "start_index": 0, "capacity": [1]}],
            "jobs": [
                {"id": 1, "location_index": 1, "delivery": [1], "priority": 10},
                {"id": 2, "location_index": 2, "delivery": [1], "priority": 100}
            ],
            "matrix": [[0, 5, 5], [5, 0, 5], [5, 5, 0]]
        }"#,
        single_threaded(),
    );

    assert_eq!(document.summary.unassigned, 1);
    assert_eq!(document.unassigned[0].id, 1);
    let routed: Vec<_> = document.routes[0]
        .steps
        .iter()
        .filter_map(|step| step.id)
        .collect();
    assert_eq!(routed, vec![2]);
}

#[test]
fn identical_runs_produce_identical_output() {
    let input = r#"{
        "vehicles": [
            {"id": 1, "start_index": 0, "end_index": 0, "capacity": [4]},
            {"id": 2, "start_index": 0, "end_index": 0, "capacity": [4]}
        ],
        "jobs": [
            {"id": 1, "location_index": 1, "delivery": [1]},
            {"id": 2, "location_index": 2, "delivery": [1]},
            {"id": 3, "location_index": 3, "delivery": [1]},
            {"id": 4, "location_index": 4, "delivery": [1]},
            {"id": 5, "location_index": 5, "delivery": [1]},
            {"id": 6, "location_index": 6, "delivery": [1]}
        ],
        "matrix": [
            [0, 3, 7, 2, 9, 4, 6],
            [3, 0, 5, 8, 1, 7, 2],
            [7, 5, 0, 4, 6, 3, 8],
            [2, 8, 4, 0, 5, 9, 1],
            [9, 1, 6, 5, 0, 2, 7],
            [4, 7, 3, 9, 2, 0, 5],
            [6, 2, 8, 1, 7, 5, 0]
        ]
    }"#;

    let first = output::to_json(&solve(input, single_threaded()));
    let second = output::to_json(&solve(input, single_threaded()));
    assert_eq!(first, second);
}

#[test]
fn forced_steps_are_honored() {
    let document = solve(
        r#"{
            "vehicles": [{
                "id": 1, "start_index": 0, "end_index": 0,
                "steps": [
                    {"type": "start"},
                    {"type": "job", "id": 2, "service_at": 100},
                    {"type": "job", "id": 1},
                    {"type": "end"}
                ]
            }],
            "jobs": [
                {"id": 1, "location_index": 1, "time_windows": [[0, 10000]]},
                {"id": 2, "location_index": 2, "time_windows": [[0, 10000]]}
            ],
            "matrix": [[0, 10, 10], [10, 0, 10], [10, 10, 0]]
        }"#,
        single_threaded(),
    );

    assert_eq!(document.summary.unassigned, 0);
    let routed: Vec<_> = document.routes[0]
        .steps
        .iter()
        .filter_map(|step| step.id)
        .collect();
    assert_eq!(routed, vec![2, 1]);
}
