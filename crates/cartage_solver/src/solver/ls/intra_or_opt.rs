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

use super::or_opt::OR_OPT_LEN;

/// **IntraOrOpt**
///
/// Moves three consecutive steps to another position in the same route. The
/// segment must be self-contained shipment-wise so nothing can cross its
/// partner.
#[derive(Debug, Clone)]
pub struct IntraOrOptOperator {
    pub route: RouteIdx,
    pub from: usize,
    pub to: usize,
    pub segment: [JobIdx; OR_OPT_LEN],
    pub delta: Eval,
}

impl LocalSearchOperator for IntraOrOptOperator {
    const NAME: &'static str = "IntraOrOpt";

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
        if route.len() <= OR_OPT_LEN {
            return;
        }

        for from in 0..=route.len() - OR_OPT_LEN {
            let end = from + OR_OPT_LEN;
            if !solution.segment_is_movable(r1, from, end)
                || !route.segment_is_self_contained(problem, from, end)
            {
                continue;
            }
            let segment: [JobIdx; OR_OPT_LEN] = [
                route.job_at(from),
                route.job_at(from + 1),
                route.job_at(from + 2),
            ];

            for to in (0..=route.len()).filter(|&to| to < from || to > end) {
                if let Some(delta) =
                    eval_move_segment_within(problem, route, from, OR_OPT_LEN, to)
                {
                    consumer(IntraOrOptOperator {
                        route: r1,
                        from,
                        to,
                        segment,
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
        let end = self.from + OR_OPT_LEN;
        if end > route.len()
            || self.to > route.len()
            || route.jobs()[self.from..end] != self.segment
        {
            return false;
        }
        eval_move_segment_within(problem, route, self.from, OR_OPT_LEN, self.to)
            == Some(self.delta)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let route = solution.route_mut(self.route);
        if self.to < self.from {
            let mut replacement = Vec::with_capacity(self.from + OR_OPT_LEN - self.to);
            replacement.extend_from_slice(&self.segment);
            replacement.extend_from_slice(&route.jobs()[self.to..self.from].to_vec());
            route.replace(problem, self.to, self.from + OR_OPT_LEN, &replacement);
        } else {
            let mut replacement =
                route.jobs()[self.from + OR_OPT_LEN..self.to].to_vec();
            replacement.extend_from_slice(&self.segment);
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

    fn four_job_solution() -> SolutionState {
        let problem = test_utils::corridor_problem(5, 1, 100);
        let mut solution = SolutionState::new(problem);
        let route = RouteIdx::new(0);
        solution.insert_job(route, 0, JobIdx::new(3));
        solution.insert_job(route, 1, JobIdx::new(0));
        solution.insert_job(route, 2, JobIdx::new(1));
        solution.insert_job(route, 3, JobIdx::new(2));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<IntraOrOptOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<IntraOrOptOperator> = None;
        IntraOrOptOperator::generate_moves(
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
        let mut solution = four_job_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("segment moves exist");
        assert!(op.is_valid(&problem, &solution));

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        assert_eq!(solution.route(op.route).len(), 4);
        // The segment survives in order somewhere in the route.
        let jobs = solution.route(op.route).jobs();
        assert!(jobs.windows(OR_OPT_LEN).any(|window| window == op.segment));
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = four_job_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("segment moves exist");
        op.apply(&problem, &mut solution);

        IntraOrOptOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
