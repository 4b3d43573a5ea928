use crate::problem::{
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_replace,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **ReverseTwoOpt**
///
/// Recombines a head of the second route, reversed, onto a head of the first:
///
/// ```text
/// BEFORE:  A: a0 .. a(i-1) | a(i) .. an      B: b0 .. b(j-1) | b(j) .. bm
/// AFTER:   A: a0 .. a(i-1) | b(j-1) .. b0    B: an .. a(i) | b(j) .. bm
/// ```
///
/// Reversed stretches must be free of shipments, whose order a reversal
/// would invert.
#[derive(Debug, Clone)]
pub struct ReverseTwoOptOperator {
    pub route_a: RouteIdx,
    pub cut_a: usize,
    pub route_b: RouteIdx,
    pub cut_b: usize,
    pub delta: Eval,
}

impl LocalSearchOperator for ReverseTwoOptOperator {
    const NAME: &'static str = "ReverseTwoOpt";

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
        let a = solution.route(r1);
        let b = solution.route(r2);

        for cut_a in 0..=a.len() {
            if !solution.segment_is_movable(r1, cut_a, a.len())
                || !a.segment_has_no_shipments(problem, cut_a, a.len())
            {
                continue;
            }
            for cut_b in 0..=b.len() {
                if cut_a == a.len() && cut_b == 0 {
                    continue;
                }
                if !solution.segment_is_movable(r2, 0, cut_b)
                    || !b.segment_has_no_shipments(problem, 0, cut_b)
                {
                    continue;
                }

                let delta_a = eval_replace(
                    problem,
                    a,
                    cut_a,
                    a.len(),
                    b.jobs()[..cut_b].iter().rev().copied(),
                );
                let delta_b = eval_replace(
                    problem,
                    b,
                    0,
                    cut_b,
                    a.jobs()[cut_a..].iter().rev().copied(),
                );
                if let (Some(delta_a), Some(delta_b)) = (delta_a, delta_b) {
                    consumer(ReverseTwoOptOperator {
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
        if !a.segment_has_no_shipments(problem, self.cut_a, a.len())
            || !b.segment_has_no_shipments(problem, 0, self.cut_b)
        {
            return false;
        }

        let delta_a = eval_replace(
            problem,
            a,
            self.cut_a,
            a.len(),
            b.jobs()[..self.cut_b].iter().rev().copied(),
        );
        let delta_b = eval_replace(
            problem,
            b,
            0,
            self.cut_b,
            a.jobs()[self.cut_a..].iter().rev().copied(),
        );
        match (delta_a, delta_b) {
            (Some(delta_a), Some(delta_b)) => delta_a + delta_b == self.delta,
            _ => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let mut head_b = solution.route(self.route_b).jobs()[..self.cut_b].to_vec();
        head_b.reverse();
        let mut tail_a = solution.route(self.route_a).jobs()[self.cut_a..].to_vec();
        tail_a.reverse();

        let len_a = solution.route(self.route_a).len();
        solution
            .route_mut(self.route_a)
            .replace(problem, self.cut_a, len_a, &head_b);
        solution
            .route_mut(self.route_b)
            .replace(problem, 0, self.cut_b, &tail_a);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route_a, self.route_b]
    }
}
