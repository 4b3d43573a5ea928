use crate::problem::{
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_replace,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **TwoOpt**
///
/// Recombines the tails of two routes at a pair of cut points:
///
/// ```text
/// BEFORE:  A: a0 .. a(i-1) | a(i) .. an      B: b0 .. b(j-1) | b(j) .. bm
/// AFTER:   A: a0 .. a(i-1) | b(j) .. bm      B: b0 .. b(j-1) | a(i) .. an
/// ```
#[derive(Debug, Clone)]
pub struct TwoOptOperator {
    pub route_a: RouteIdx,
    pub cut_a: usize,
    pub route_b: RouteIdx,
    pub cut_b: usize,
    pub delta: Eval,
}

impl LocalSearchOperator for TwoOptOperator {
    const NAME: &'static str = "TwoOpt";

    fn generate_moves<C>(
        problem: &VehicleRoutingProblem,
        solution: &SolutionState,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 >= r2 {
            return;
        }
        let a = solution.route(r1);
        let b = solution.route(r2);

        for cut_a in 0..=a.len() {
            if !solution.segment_is_movable(r1, cut_a, a.len())
                || !a.segment_is_self_contained(problem, cut_a, a.len())
            {
                continue;
            }
            for cut_b in 0..=b.len() {
                if cut_a == a.len() && cut_b == b.len() {
                    continue;
                }
                if !solution.segment_is_movable(r2, cut_b, b.len())
                    || !b.segment_is_self_contained(problem, cut_b, b.len())
                {
                    continue;
                }

                let delta_a = eval_replace(
                    problem,
                    a,
                    cut_a,
                    a.len(),
                    b.jobs()[cut_b..].iter().copied(),
                );
                let delta_b = eval_replace(
                    problem,
                    b,
                    cut_b,
                    b.len(),
                    a.jobs()[cut_a..].iter().copied(),
                );
                if let (Some(delta_a), Some(delta_b)) = (delta_a, delta_b) {
                    consumer(TwoOptOperator {
                        route_a: r1,
                        cut_a,
                        route_b: r2,
                        cut_b,
                        delta: delta_a + delta_b,
                    });
                }
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let a = solution.route(self.route_a);
        let b = solution.route(self.route_b);
        if self.cut_a > a.len() || self.cut_b > b.len() {
            return false;
        }
        if !a.segment_is_self_contained(problem, self.cut_a, a.len())
            || !b.segment_is_self_contained(problem, self.cut_b, b.len())
        {
            return false;
        }

        let delta_a = eval_replace(
            problem,
            a,
            self.cut_a,
            a.len(),
            b.jobs()[self.cut_b..].iter().copied(),
        );
        let delta_b = eval_replace(
            problem,
            b,
            self.cut_b,
            b.len(),
            a.jobs()[self.cut_a..].iter().copied(),
        );
        match (delta_a, delta_b) {
            (Some(delta_a), Some(delta_b)) => delta_a + delta_b == self.delta,
            _ => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let tail_a = solution.route(self.route_a).jobs()[self.cut_a..].to_vec();
        let tail_b = solution.route(self.route_b).jobs()[self.cut_b..].to_vec();

        let len_a = solution.route(self.route_a).len();
        solution
            .route_mut(self.route_a)
            .replace(problem, self.cut_a, len_a, &tail_b);
        let len_b = solution.route(self.route_b).len();
        solution
            .route_mut(self.route_b)
            .replace(problem, self.cut_b, len_b, &tail_a);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route_a, self.route_b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::job::JobIdx;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn two_route_solution() -> SolutionState {
        let problem = test_utils::corridor_problem(5, 2, 100);
        let mut solution = SolutionState::new(problem);
        solution.insert_job(RouteIdx::new(0), 0, JobIdx::new(0));
        solution.insert_job(RouteIdx::new(0), 1, JobIdx::new(3));
        solution.insert_job(RouteIdx::new(1), 0, JobIdx::new(1));
        solution.insert_job(RouteIdx::new(1), 1, JobIdx::new(2));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<TwoOptOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<TwoOptOperator> = None;
        TwoOptOperator::generate_moves(
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
        let mut solution = two_route_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("two-opt candidates exist");
        assert!(op.is_valid(&problem, &solution));

        let old_a = solution.route(op.route_a).jobs().to_vec();
        let old_b = solution.route(op.route_b).jobs().to_vec();
        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);

        let mut new_a = old_a[..op.cut_a].to_vec();
        new_a.extend_from_slice(&old_b[op.cut_b..]);
        let mut new_b = old_b[..op.cut_b].to_vec();
        new_b.extend_from_slice(&old_a[op.cut_a..]);
        assert_eq!(solution.route(op.route_a).jobs(), &new_a[..]);
        assert_eq!(solution.route(op.route_b).jobs(), &new_b[..]);
    }

    #[test]
    fn test_fresh_scan_agrees_with_is_valid_after_apply() {
        let mut solution = two_route_solution();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("two-opt candidates exist");
        op.apply(&problem, &mut solution);

        TwoOptOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(1)),
            |fresh| assert!(fresh.is_valid(&problem, &solution)),
        );
    }
}
