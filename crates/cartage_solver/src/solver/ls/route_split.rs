use crate::problem::{
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::eval_replace,
    ls::r#move::LocalSearchOperator,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// **RouteSplit**
///
/// Empties one route and redistributes its head and tail over two currently
/// empty vehicles. Pays off when a single long route outgrows its vehicle's
/// bounds or cost model.
#[derive(Debug, Clone)]
pub struct RouteSplitOperator {
    pub route: RouteIdx,
    pub split_rank: usize,
    pub head_route: RouteIdx,
    pub tail_route: RouteIdx,
    pub delta: Eval,
}

impl LocalSearchOperator for RouteSplitOperator {
    const NAME: &'static str = "RouteSplit";

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
        let source = solution.route(r1);
        if source.len() < 2 || !solution.segment_is_movable(r1, 0, source.len()) {
            return;
        }

        let empties: Vec<RouteIdx> = (0..solution.route_count())
            .map(RouteIdx::new)
            .filter(|&r| r != r1 && solution.route(r).is_empty())
            .collect();
        if empties.len() < 2 {
            return;
        }

        let Some(removal) = eval_replace(problem, source, 0, source.len(), std::iter::empty())
        else {
            return;
        };

        for split_rank in 1..source.len() {
            if !source.segment_is_self_contained(problem, 0, split_rank)
                || !source.segment_is_self_contained(problem, split_rank, source.len())
            {
                continue;
            }
            let head = source.jobs()[..split_rank].iter().copied();
            let tail = source.jobs()[split_rank..].iter().copied();

            for &head_route in &empties {
                let Some(head_delta) = eval_replace(
                    problem,
                    solution.route(head_route),
                    0,
                    0,
                    head.clone(),
                ) else {
                    continue;
                };
                for &tail_route in &empties {
                    if tail_route == head_route {
                        continue;
                    }
                    let Some(tail_delta) = eval_replace(
                        problem,
                        solution.route(tail_route),
                        0,
                        0,
                        tail.clone(),
                    ) else {
                        continue;
                    };

                    consumer(RouteSplitOperator {
                        route: r1,
                        split_rank,
                        head_route,
                        tail_route,
                        delta: removal + head_delta + tail_delta,
                    });
                }
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let source = solution.route(self.route);
        if self.split_rank >= source.len()
            || !solution.route(self.head_route).is_empty()
            || !solution.route(self.tail_route).is_empty()
        {
            return false;
        }

        let removal = eval_replace(problem, source, 0, source.len(), std::iter::empty());
        let head_delta = eval_replace(
            problem,
            solution.route(self.head_route),
            0,
            0,
            source.jobs()[..self.split_rank].iter().copied(),
        );
        let tail_delta = eval_replace(
            problem,
            solution.route(self.tail_route),
            0,
            0,
            source.jobs()[self.split_rank..].iter().copied(),
        );
        match (removal, head_delta, tail_delta) {
            (Some(removal), Some(head_delta), Some(tail_delta)) => {
                removal + head_delta + tail_delta == self.delta
            }
            _ => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        let head = solution.route(self.route).jobs()[..self.split_rank].to_vec();
        let tail = solution.route(self.route).jobs()[self.split_rank..].to_vec();

        let len = solution.route(self.route).len();
        solution.route_mut(self.route).replace(problem, 0, len, &[]);
        solution
            .route_mut(self.head_route)
            .replace(problem, 0, 0, &head);
        solution
            .route_mut(self.tail_route)
            .replace(problem, 0, 0, &tail);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route, self.head_route, self.tail_route]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::job::JobIdx;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn loaded_first_vehicle() -> SolutionState {
        let problem = test_utils::corridor_problem(3, 3, 100);
        let mut solution = SolutionState::new(problem);
        solution.insert_job(RouteIdx::new(0), 0, JobIdx::new(0));
        solution.insert_job(RouteIdx::new(0), 1, JobIdx::new(1));
        solution
    }

    fn best_move(solution: &SolutionState) -> Option<RouteSplitOperator> {
        let problem = std::sync::Arc::clone(solution.problem());
        let mut best: Option<RouteSplitOperator> = None;
        RouteSplitOperator::generate_moves(
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
        let mut solution = loaded_first_vehicle();
        let problem = std::sync::Arc::clone(solution.problem());

        let op = best_move(&solution).expect("splits onto empty vehicles exist");
        assert!(op.is_valid(&problem, &solution));

        let head = solution.route(op.route).jobs()[..op.split_rank].to_vec();
        let tail = solution.route(op.route).jobs()[op.split_rank..].to_vec();
        let before = solution.total_cost();
        op.apply(&problem, &mut solution);

        assert_eq!(solution.total_cost(), before + op.delta.cost);
        assert!(solution.route(op.route).is_empty());
        assert_eq!(solution.route(op.head_route).jobs(), &head[..]);
        assert_eq!(solution.route(op.tail_route).jobs(), &tail[..]);
    }

    #[test]
    fn test_needs_two_empty_vehicles() {
        let problem = test_utils::corridor_problem(3, 2, 100);
        let mut solution = SolutionState::new(problem.clone());
        solution.insert_job(RouteIdx::new(0), 0, JobIdx::new(0));
        solution.insert_job(RouteIdx::new(0), 1, JobIdx::new(1));

        RouteSplitOperator::generate_moves(
            &problem,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(0)),
            |_| panic!("one spare vehicle cannot host a split"),
        );
    }
}
