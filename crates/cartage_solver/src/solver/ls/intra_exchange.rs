use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_replace,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **IntraExchange**
///
/// Swaps two jobs within one route. A shipment half only participates when
/// its partner sits outside the swapped stretch, so the pair order holds.
#[derive(Debug, Clone)]
pub struct IntraExchangeOperator {
    pub route: RouteIdx,
    pub first: usize,
    pub second: usize,
    pub jobs: [JobIdx; 2],
    pub delta: Eval,
}

fn partner_outside(
    problem: &VehicleRoutingProblem,
    route: &crate::solver::solution::route::Route,
    job: JobIdx,
    lo: usize,
    hi: usize,
) -> bool {
    match problem.matching_partner(job) {
        Some(partner) => route
            .rank_of(partner)
            .map_or(true, |rank| rank < lo || rank > hi),
        None => true,
    }
}

impl LocalSearchOperator for IntraExchangeOperator {
    const NAME: &'static str = "IntraExchange";

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

        for first in 0..route.len() {
            let job_a = route.job_at(first);
            if solution.is_fixed(job_a) {
                continue;
            }
            for second in first + 1..route.len() {
                let job_b = route.job_at(second);
                if solution.is_fixed(job_b)
                    || !partner_outside(problem, route, job_a, first, second)
                    || !partner_outside(problem, route, job_b, first, second)
                {
                    continue;
                }

                let middle = route.jobs()[first + 1..second].iter().copied();
                let candidate = std::iter::once(job_b)
                    .chain(middle)
                    .chain(std::iter::once(job_a));
                if let Some(delta) = eval_replace(problem, route, first, second + 1, candidate) {
                    consumer(IntraExchangeOperator {
                        route: r1,
                        first,
                        second,
                        jobs: [job_a, job_b],
                        delta,
                    });
                }
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let route = solution.route(self.route);
        if self.second >= route.len()
            || route.job_at(self.first) != self.jobs[0]
            || route.job_at(self.second) != self.jobs[1]
        {
            return false;
        }

        let middle = route.jobs()[self.first + 1..self.second].iter().copied();
        let candidate = std::iter::once(self.jobs[1])
            .chain(middle)
            .chain(std::iter::once(self.jobs[0]));
        eval_replace(problem, route, self.first, self.second + 1, candidate) == Some(self.delta)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let route = solution.route_mut(self.route);
        let mut replacement = Vec::with_capacity(self.second + 1 - self.first);
        replacement.push(self.jobs[1]);
        replacement.extend_from_slice(&route.jobs()[self.first + 1..self.second].to_vec());
        replacement.push(self.jobs[0]);
        route.replace(problem, self.first, self.second + 1, &replacement);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn reversed_solution() -> SolutionState {
        // Open route so the reversal is not cost-neutral.
        let problem = test_utils::problem(&format!(
            r#"{{
                "vehicles": [{{"id": 1, "start_index": 0}}],
                "jobs": [
                    {{"id": 1, "location_index": 1}},
                    {{"id": 2, "location_index": 2}},
                    {{"id": 3, "location_index": 3}}
                ],
                "matrix": {}
            }}"#,
            test_utils::corridor_matrix(4, 100)
        ));
        let mut solution = SolutionState::new(problem);
        let route = RouteIdx::new(0);
        solution.insert_job(route, 0, JobIdx::new(2));
        solution.insert_job(route, 1, JobIdx::new(1));
        solution.insert_job(route, 2, JobIdx::new(0));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<IntraExchangeOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<IntraExchangeOperator> = None;
        IntraExchangeOperator::generate_moves(
            &problem,
            solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |op| {
                if best.as_ref().map_or(true, |held| op.delta.cost < held.delta.cost) {
                    best = Some(op);
                }
            },
        );
        best
    }

    #[test]
    fn test_applied_cost_matches_delta() {
        let mut solution = reversed_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("swap candidates exist");
        assert!(op.is_valid(&problem, &solution));
        assert!(op.delta.cost < 0);

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        // The two jobs traded places; the middle stayed put.
        assert_eq!(solution.route(op.route).job_at(op.first), op.jobs[1]);
        assert_eq!(solution.route(op.route).job_at(op.second), op.jobs[0]);
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = reversed_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("swap candidates exist");
        op.apply(&problem, &mut solution);

        IntraExchangeOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
