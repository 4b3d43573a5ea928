pub mod violations;

use crate::solver::solution::solution_state::SolutionState;

use violations::Violation;

/// Final feasibility recheck over every route of a solution.
pub fn solution_violations(solution: &SolutionState) -> Vec<Vec<Violation>> {
    let problem = solution.problem();
    solution
        .routes()
        .iter()
        .map(|route| violations::check_route(problem, route))
        .collect()
}

pub fn violation_count(per_route: &[Vec<Violation>]) -> usize {
    per_route.iter().map(Vec::len).sum()
}
