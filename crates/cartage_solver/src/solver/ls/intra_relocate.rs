use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_move_segment_within,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **IntraRelocate**
///
/// Moves one job to another position in its own route. Shipment halves stay
/// on their side of the partner: a pickup may not pass its delivery and vice
/// versa.
#[derive(Debug, Clone)]
pub struct IntraRelocateOperator {
    pub route: RouteIdx,
    pub from: usize,
    pub to: usize,
    pub job: JobIdx,
    pub delta: Eval,
}

impl LocalSearchOperator for IntraRelocateOperator {
    const NAME: &'static str = "IntraRelocate";

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

        for from in 0..route.len() {
            let job = route.job_at(from);
            if solution.is_fixed(job) {
                continue;
            }

            let (lo, hi) = match problem.matching_partner(job) {
                Some(partner) => {
                    let partner_rank = route
                        .rank_of(partner)
                        .expect("shipment halves share a route");
                    if problem.job(job).is_pickup() {
                        (0, partner_rank)
                    } else {
                        (partner_rank + 1, route.len())
                    }
                }
                None => (0, route.len()),
            };

            for to in lo..=hi {
                if to == from || to == from + 1 {
                    continue;
                }
                if let Some(delta) = eval_move_segment_within(problem, route, from, 1, to) {
                    consumer(IntraRelocateOperator {
                        route: r1,
                        from,
                        to,
                        job,
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
        if self.from >= route.len()
            || self.to > route.len()
            || route.job_at(self.from) != self.job
        {
            return false;
        }
        eval_move_segment_within(problem, route, self.from, 1, self.to) == Some(self.delta)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let route = solution.route_mut(self.route);
        if self.to < self.from {
            let mut replacement = Vec::with_capacity(self.from + 1 - self.to);
            replacement.push(self.job);
            replacement.extend_from_slice(&route.jobs()[self.to..self.from].to_vec());
            route.replace(problem, self.to, self.from + 1, &replacement);
        } else {
            let mut replacement = route.jobs()[self.from + 1..self.to].to_vec();
            replacement.push(self.job);
            route.replace(problem, self.from, self.to, &replacement);
        }
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

    fn tangled_solution() -> SolutionState {
        let problem = test_utils::corridor_problem(4, 1, 100);
        let mut solution = SolutionState::new(problem);
        let route = RouteIdx::new(0);
        solution.insert_job(route, 0, JobIdx::new(2));
        solution.insert_job(route, 1, JobIdx::new(0));
        solution.insert_job(route, 2, JobIdx::new(1));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<IntraRelocateOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<IntraRelocateOperator> = None;
        IntraRelocateOperator::generate_moves(
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
        let mut solution = tangled_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("relocate candidates exist");
        assert!(op.is_valid(&problem, &solution));
        // Untangling the corridor must pay off.
        assert!(op.delta.cost < 0);

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        assert_eq!(solution.route(op.route).len(), 3);
        let landed = if op.to < op.from { op.to } else { op.to - 1 };
        assert_eq!(solution.route(op.route).job_at(landed), op.job);
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = tangled_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("relocate candidates exist");
        op.apply(&problem, &mut solution);

        IntraRelocateOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
