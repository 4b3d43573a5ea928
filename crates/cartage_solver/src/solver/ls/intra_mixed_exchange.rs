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

use super::intra_cross_exchange::segment_partners_admissible;

/// **IntraMixedExchange**
///
/// Swaps a two-step segment with a single step elsewhere in the same route.
/// The single step always sits after the segment; the mirrored case is the
/// same move generated from the other segment start.
#[derive(Debug, Clone)]
pub struct IntraMixedExchangeOperator {
    pub route: RouteIdx,
    pub segment_rank: usize,
    pub single_rank: usize,
    pub segment: [JobIdx; 2],
    pub single: JobIdx,
    pub delta: Eval,
}

impl LocalSearchOperator for IntraMixedExchangeOperator {
    const NAME: &'static str = "IntraMixedExchange";

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
        if route.len() < 3 {
            return;
        }

        for segment_rank in 0..=route.len() - 3 {
            if !solution.segment_is_movable(r1, segment_rank, segment_rank + 2) {
                continue;
            }
            for single_rank in segment_rank + 2..route.len() {
                let single = route.job_at(single_rank);
                if solution.is_fixed(single)
                    || !segment_partners_admissible(
                        problem,
                        route,
                        segment_rank,
                        segment_rank + 2,
                        segment_rank,
                        single_rank + 1,
                    )
                    || !segment_partners_admissible(
                        problem,
                        route,
                        single_rank,
                        single_rank + 1,
                        segment_rank,
                        single_rank + 1,
                    )
                {
                    continue;
                }

                let candidate = std::iter::once(single)
                    .chain(route.jobs()[segment_rank + 2..single_rank].iter().copied())
                    .chain(route.jobs()[segment_rank..segment_rank + 2].iter().copied());
                if let Some(delta) =
                    eval_replace(problem, route, segment_rank, single_rank + 1, candidate)
                {
                    consumer(IntraMixedExchangeOperator {
                        route: r1,
                        segment_rank,
                        single_rank,
                        segment: [route.job_at(segment_rank), route.job_at(segment_rank + 1)],
                        single,
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
        if self.single_rank >= route.len()
            || route.jobs()[self.segment_rank..self.segment_rank + 2] != self.segment
            || route.job_at(self.single_rank) != self.single
        {
            return false;
        }

        let candidate = std::iter::once(self.single)
            .chain(
                route.jobs()[self.segment_rank + 2..self.single_rank]
                    .iter()
                    .copied(),
            )
            .chain(self.segment.iter().copied());
        eval_replace(
            problem,
            route,
            self.segment_rank,
            self.single_rank + 1,
            candidate,
        ) == Some(self.delta)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let route = solution.route_mut(self.route);
        let mut replacement = Vec::with_capacity(self.single_rank + 1 - self.segment_rank);
        replacement.push(self.single);
        replacement
            .extend_from_slice(&route.jobs()[self.segment_rank + 2..self.single_rank].to_vec());
        replacement.extend_from_slice(&self.segment);
        route.replace(problem, self.segment_rank, self.single_rank + 1, &replacement);
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

    fn single_last_solution() -> SolutionState {
        // Open route so trading the single for the segment pays off.
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
        solution.insert_job(route, 0, JobIdx::new(1));
        solution.insert_job(route, 1, JobIdx::new(2));
        solution.insert_job(route, 2, JobIdx::new(0));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<IntraMixedExchangeOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<IntraMixedExchangeOperator> = None;
        IntraMixedExchangeOperator::generate_moves(
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
        let mut solution = single_last_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("mixed swaps exist");
        assert!(op.is_valid(&problem, &solution));
        assert!(op.delta.cost < 0);

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        // Single to the segment's head, segment to the tail of the span.
        assert_eq!(solution.route(op.route).job_at(op.segment_rank), op.single);
        assert_eq!(
            &solution.route(op.route).jobs()[op.single_rank - 1..=op.single_rank],
            &op.segment[..]
        );
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = single_last_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("mixed swaps exist");
        op.apply(&problem, &mut solution);

        IntraMixedExchangeOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
