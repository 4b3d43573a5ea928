use crate::problem::{
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::{eval_remove, eval_replace},
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// Segment length moved by Or-Opt.
pub(super) const OR_OPT_LEN: usize = 3;

/// **OrOpt**
///
/// Moves three consecutive steps from one route into another, keeping their
/// order. Shipments are fine as long as both halves ride along.
#[derive(Debug, Clone)]
pub struct OrOptOperator {
    pub from_route: RouteIdx,
    pub from_rank: usize,
    pub to_route: RouteIdx,
    pub to_rank: usize,
    pub segment: [JobIdx; OR_OPT_LEN],
    pub delta: Eval,
}

impl LocalSearchOperator for OrOptOperator {
    const NAME: &'static str = "OrOpt";

    fn generate_moves<C>(
        problem: &VehicleRoutingProblem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 == r2 {
            return;
        }
        let from = solution.route(r1);
        let to = solution.route(r2);
        if from.len() < OR_OPT_LEN {
            return;
        }

        for from_rank in 0..=from.len() - OR_OPT_LEN {
            let end = from_rank + OR_OPT_LEN;
            if !solution.segment_is_movable(r1, from_rank, end)
                || !from.segment_is_self_contained(problem, from_rank, end)
            {
                continue;
            }
            let Some(removal) = eval_remove(problem, from, from_rank, OR_OPT_LEN) else {
                continue;
            };
            let segment: [JobIdx; OR_OPT_LEN] = [
                from.job_at(from_rank),
                from.job_at(from_rank + 1),
                from.job_at(from_rank + 2),
            ];

            for to_rank in 0..=to.len() {
                let insertion =
                    eval_replace(problem, to, to_rank, to_rank, segment.iter().copied());
                if let Some(insertion) = insertion {
                    consumer(OrOptOperator {
                        from_route: r1,
                        from_rank,
                        to_route: r2,
                        to_rank,
                        segment,
                        delta: removal + insertion,
                    });
                }
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let from = solution.route(self.from_route);
        let to = solution.route(self.to_route);
        let end = self.from_rank + OR_OPT_LEN;
        if end > from.len()
            || self.to_rank > to.len()
            || from.jobs()[self.from_rank..end] != self.segment
        {
            return false;
        }

        match (
            eval_remove(problem, from, self.from_rank, OR_OPT_LEN),
            eval_replace(problem, to, self.to_rank, self.to_rank, self.segment.iter().copied()),
        ) {
            (Some(removal), Some(insertion)) => removal + insertion == self.delta,
            _ => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        solution
            .route_mut(self.from_route)
            .remove(problem, self.from_rank, OR_OPT_LEN);
        solution
            .route_mut(self.to_route)
            .replace(problem, self.to_rank, self.to_rank, &self.segment);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.from_route, self.to_route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn solution_with_segment() -> SolutionState {
        let problem = test_utils::corridor_problem(6, 2, 100);
        let mut solution = SolutionState::new(problem);
        solution.insert_job(RouteIdx::new(0), 0, JobIdx::new(0));
        solution.insert_job(RouteIdx::new(0), 1, JobIdx::new(1));
        solution.insert_job(RouteIdx::new(0), 2, JobIdx::new(2));
        solution.insert_job(RouteIdx::new(1), 0, JobIdx::new(3));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<OrOptOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<OrOptOperator> = None;
        OrOptOperator::generate_moves(
            &problem,
            solution,
            (RouteIdx::new(0), RouteIdx::new(1)),
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
        let mut solution = solution_with_segment();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("or-opt candidates exist");
        assert!(op.is_valid(&problem, &solution));

        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        // The segment lands in order at the target gap.
        assert_eq!(
            &solution.route(op.to_route).jobs()[op.to_rank..op.to_rank + OR_OPT_LEN],
            &op.segment[..]
        );
        assert!(solution.route(op.from_route).is_empty());
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = solution_with_segment();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("or-opt candidates exist");
        op.apply(&problem, &mut solution);

        OrOptOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(1), RouteIdx::new(0)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
