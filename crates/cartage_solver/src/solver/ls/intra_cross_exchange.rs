use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_replace,
    ls::r#move::LocalSearchOperator,
    solution::route::Route,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **IntraCrossExchange**
///
/// Swaps two disjoint two-step segments within one route. Shipment halves in
/// a segment need their partner either in the same segment or outside the
/// whole affected stretch.
#[derive(Debug, Clone)]
pub struct IntraCrossExchangeOperator {
    pub route: RouteIdx,
    pub first: usize,
    pub second: usize,
    pub segment_a: [JobIdx; 2],
    pub segment_b: [JobIdx; 2],
    pub delta: Eval,
}

pub(super) fn segment_partners_admissible(
    problem: &VehicleRoutingProblem,
    route: &Route,
    segment_lo: usize,
    segment_hi: usize,
    span_lo: usize,
    span_hi: usize,
) -> bool {
    (segment_lo..segment_hi).all(|rank| {
        match problem.matching_partner(route.job_at(rank)) {
            Some(partner) => match route.rank_of(partner) {
                Some(partner_rank) => {
                    (segment_lo <= partner_rank && partner_rank < segment_hi)
                        || partner_rank < span_lo
                        || partner_rank >= span_hi
                }
                None => false,
            },
            None => true,
        }
    })
}

impl LocalSearchOperator for IntraCrossExchangeOperator {
    const NAME: &'static str = "IntraCrossExchange";

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
        if route.len() < 4 {
            return;
        }

        for first in 0..=route.len() - 4 {
            if !solution.segment_is_movable(r1, first, first + 2) {
                continue;
            }
            for second in first + 2..=route.len() - 2 {
                if !solution.segment_is_movable(r1, second, second + 2)
                    || !segment_partners_admissible(
                        problem,
                        route,
                        first,
                        first + 2,
                        first,
                        second + 2,
                    )
                    || !segment_partners_admissible(
                        problem,
                        route,
                        second,
                        second + 2,
                        first,
                        second + 2,
                    )
                {
                    continue;
                }

                let candidate = route.jobs()[second..second + 2]
                    .iter()
                    .chain(route.jobs()[first + 2..second].iter())
                    .chain(route.jobs()[first..first + 2].iter())
                    .copied();
                if let Some(delta) = eval_replace(problem, route, first, second + 2, candidate) {
                    consumer(IntraCrossExchangeOperator {
                        route: r1,
                        first,
                        second,
                        segment_a: [route.job_at(first), route.job_at(first + 1)],
                        segment_b: [route.job_at(second), route.job_at(second + 1)],
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
        if self.second + 2 > route.len()
            || route.jobs()[self.first..self.first + 2] != self.segment_a
            || route.jobs()[self.second..self.second + 2] != self.segment_b
        {
            return false;
        }

        let candidate = route.jobs()[self.second..self.second + 2]
            .iter()
            .chain(route.jobs()[self.first + 2..self.second].iter())
            .chain(route.jobs()[self.first..self.first + 2].iter())
            .copied();
        eval_replace(problem, route, self.first, self.second + 2, candidate) == Some(self.delta)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let route = solution.route_mut(self.route);
        let mut replacement = Vec::with_capacity(self.second + 2 - self.first);
        replacement.extend_from_slice(&self.segment_b);
        replacement.extend_from_slice(&route.jobs()[self.first + 2..self.second].to_vec());
        replacement.extend_from_slice(&self.segment_a);
        route.replace(problem, self.first, self.second + 2, &replacement);
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

    fn swapped_halves_solution() -> SolutionState {
        let problem = test_utils::corridor_problem(5, 1, 100);
        let mut solution = SolutionState::new(problem);
        let route = RouteIdx::new(0);
        solution.insert_job(route, 0, JobIdx::new(2));
        solution.insert_job(route, 1, JobIdx::new(3));
        solution.insert_job(route, 2, JobIdx::new(0));
        solution.insert_job(route, 3, JobIdx::new(1));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<IntraCrossExchangeOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<IntraCrossExchangeOperator> = None;
        IntraCrossExchangeOperator::generate_moves(
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
        let mut solution = swapped_halves_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("segment swaps exist");
        assert!(op.is_valid(&problem, &solution));
        assert!(op.delta.cost < 0);

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        // Equal-length segments: both land on the other's ranks.
        assert_eq!(
            &solution.route(op.route).jobs()[op.first..op.first + 2],
            &op.segment_b[..]
        );
        assert_eq!(
            &solution.route(op.route).jobs()[op.second..op.second + 2],
            &op.segment_a[..]
        );
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = swapped_halves_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("segment swaps exist");
        op.apply(&problem, &mut solution);

        IntraCrossExchangeOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
