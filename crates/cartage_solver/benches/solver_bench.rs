use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cartage_solver::json;
use cartage_solver::solver::solver::Solver;
use cartage_solver::solver::solver_params::SolverParams;

fn synthetic_instance(jobs: usize, vehicles: usize) -> String {
    let n = jobs + 1;
    let job_entries: Vec<String> = (1..=jobs)
        .map(|id| {
            format!(
                r#"{{"id": {id}, "location_index": {}, "delivery": [1], "service": 120}}"#,
                (id % jobs) + 1
            )
        })
        .collect();
    let vehicle_entries: Vec<String> = (1..=vehicles)
        .map(|id| {
            format!(
                r#"{{"id": {id}, "start_index": 0, "end_index": 0, "capacity": [{}]}}"#,
                jobs / vehicles + 1
            )
        })
        .collect();
    let rows: Vec<String> = (0..n)
        .map(|i| {
            let row: Vec<String> = (0..n)
                .map(|j| ((i * 83 + j * 31) % 900 + i.abs_diff(j)).to_string())
                .collect();
            format!("[{}]", row.join(","))
        })
        .collect();
    format!(
        r#"{{"vehicles": [{}], "jobs": [{}], "matrix": [{}]}}"#,
        vehicle_entries.join(","),
        job_entries.join(","),
        rows.join(",")
    )
}

fn bench_solve(c: &mut Criterion) {
    let input = synthetic_instance(40, 4);
    let params = SolverParams {
        threads: 1,
        exploration_level: 1,
        timeout: None,
    };

    c.bench_function("solve_40_jobs_4_vehicles", |b| {
        b.iter(|| {
            let problem = json::parse_problem(black_box(&input)).unwrap();
            let outcome = Solver::new(problem, params.clone()).solve();
            black_box(outcome.solution.total_cost())
        })
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
