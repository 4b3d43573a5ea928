use std::cmp::Reverse;

use tracing::{debug, trace};

use crate::problem::{
    scale::{Cost, Eval},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    deadline::Deadline,
    insertion::best_insertion,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

use super::{
    cross_exchange::CrossExchangeOperator, intra_cross_exchange::IntraCrossExchangeOperator,
    intra_exchange::IntraExchangeOperator, intra_mixed_exchange::IntraMixedExchangeOperator,
    intra_or_opt::IntraOrOptOperator, intra_relocate::IntraRelocateOperator,
    intra_two_opt::IntraTwoOptOperator, mixed_exchange::MixedExchangeOperator,
    or_opt::OrOptOperator, pd_shift::PDShiftOperator, priority_replace::PriorityReplaceOperator,
    r#move::{LocalSearchOperator, Move},
    relocate::RelocateOperator, reverse_two_opt::ReverseTwoOptOperator,
    route_exchange::RouteExchangeOperator, route_split::RouteSplitOperator,
    swap_star::SwapStarOperator, tsp_fix::TspFixOperator, two_opt::TwoOptOperator,
    unassigned_exchange::UnassignedExchangeOperator,
};

/// Steepest-descent search: keep a best-move table per route pair, apply the
/// globally best strictly improving move, rescan only the pairs touching the
/// routes it changed, and stop when no improving move remains or the
/// deadline fires.
pub struct LocalSearch {
    /// Flat (route, route) table of the best known move per pair.
    table: Vec<Option<(Eval, Move)>>,
    /// Pairs whose table entry is stale.
    queue: Vec<(usize, usize)>,
    route_count: usize,
}

impl LocalSearch {
    pub fn new(route_count: usize) -> Self {
        let mut queue = Vec::with_capacity(route_count * route_count);
        for r1 in 0..route_count {
            for r2 in 0..route_count {
                queue.push((r1, r2));
            }
        }

        LocalSearch {
            table: vec![None; route_count * route_count],
            queue,
            route_count,
        }
    }

    pub fn run(
        &mut self,
        problem: &VehicleRoutingProblem,
        solution: &mut SolutionState,
        deadline: &Deadline,
    ) -> usize {
        let mut applied = 0usize;

        loop {
            if deadline.expired() {
                debug!(applied, "local search stopped on deadline");
                return applied;
            }

            for &(r1, r2) in &self.queue {
                if deadline.expired() {
                    debug!(applied, "local search stopped on deadline");
                    return applied;
                }
                self.table[r1 * self.route_count + r2] = best_move_for_pair(
                    problem,
                    solution,
                    (RouteIdx::new(r1), RouteIdx::new(r2)),
                );
            }
            self.queue.clear();

            let mut best_idx: Option<usize> = None;
            let mut best_cost: Cost = 0;
            for (idx, entry) in self.table.iter().enumerate() {
                if let Some((delta, _)) = entry {
                    if delta.cost < best_cost {
                        best_cost = delta.cost;
                        best_idx = Some(idx);
                    }
                }
            }

            let Some(idx) = best_idx else {
                debug!(applied, "local search converged");
                return applied;
            };

            let (delta, candidate) = self.table[idx].take().expect("selected entry is filled");
            if !candidate.is_valid(problem, solution) {
                // Stale against the current state; rescan the pair.
                self.queue.push((idx / self.route_count, idx % self.route_count));
                continue;
            }

            trace!(
                operator = candidate.operator_name(),
                cost_delta = delta.cost,
                "applying move"
            );
            candidate.apply(problem, solution);
            applied += 1;

            let updated = candidate.updated_routes();
            for r in 0..self.route_count {
                for &touched in &updated {
                    let t = touched.get();
                    self.invalidate(r, t);
                    if r != t {
                        self.invalidate(t, r);
                    }
                }
            }
        }
    }

    fn invalidate(&mut self, r1: usize, r2: usize) {
        self.table[r1 * self.route_count + r2] = None;
        if !self.queue.contains(&(r1, r2)) {
            self.queue.push((r1, r2));
        }
    }
}

/// Best strictly improving move over the whole catalog for one route pair,
/// visited in fixed catalog order so ties stay deterministic.
fn best_move_for_pair(
    problem: &VehicleRoutingProblem,
    solution: &SolutionState,
    pair: (RouteIdx, RouteIdx),
) -> Option<(Eval, Move)> {
    let mut best: Option<(Eval, Move)> = None;

    macro_rules! scan {
        ($operator:ty, $wrap:expr) => {
            <$operator>::generate_moves(problem, solution, pair, |op| {
                let delta = op.delta();
                if delta.is_improvement()
                    && best.as_ref().map_or(true, |(held, _)| delta.cost < held.cost)
                {
                    best = Some((delta, $wrap(op)));
                }
            });
        };
    }

    scan!(UnassignedExchangeOperator, Move::UnassignedExchange);
    scan!(CrossExchangeOperator, Move::CrossExchange);
    scan!(MixedExchangeOperator, Move::MixedExchange);
    scan!(TwoOptOperator, Move::TwoOpt);
    scan!(ReverseTwoOptOperator, Move::ReverseTwoOpt);
    scan!(RelocateOperator, Move::Relocate);
    scan!(OrOptOperator, Move::OrOpt);
    scan!(IntraExchangeOperator, Move::IntraExchange);
    scan!(IntraCrossExchangeOperator, Move::IntraCrossExchange);
    scan!(IntraMixedExchangeOperator, Move::IntraMixedExchange);
    scan!(IntraRelocateOperator, Move::IntraRelocate);
    scan!(IntraOrOptOperator, Move::IntraOrOpt);
    scan!(IntraTwoOptOperator, Move::IntraTwoOpt);
    scan!(PDShiftOperator, Move::PDShift);
    scan!(RouteExchangeOperator, Move::RouteExchange);
    scan!(SwapStarOperator, Move::SwapStar);
    scan!(RouteSplitOperator, Move::RouteSplit);
    scan!(TspFixOperator, Move::TspFix);

    best
}

/// Post-search pass over leftover tasks: single-shot re-insertions in
/// (priority, amount, id) order, then priority-driven evictions, repeated
/// until nothing changes.
pub fn recover_unassigned(
    problem: &VehicleRoutingProblem,
    solution: &mut SolutionState,
    deadline: &Deadline,
) {
    loop {
        if deadline.expired() {
            return;
        }
        let mut changed = false;

        let mut jobs = solution.unassigned_sorted();
        jobs.sort_by(|&x, &y| {
            let jx = problem.job(x);
            let jy = problem.job(y);
            jy.priority()
                .cmp(&jx.priority())
                .then_with(|| jy.amount_key().lex_cmp(&jx.amount_key()))
                .then_with(|| jx.id().cmp(&jy.id()))
        });

        for job in jobs {
            if deadline.expired() {
                return;
            }
            if !solution.is_unassigned(job) {
                continue;
            }
            if let Some((_, insertion)) = best_insertion(problem, solution, job) {
                insertion.commit(solution);
                changed = true;
            }
        }

        // One eviction per round; freed capacity feeds the next insertion
        // pass.
        let mut best: Option<(ReplaceKey, PriorityReplaceOperator)> = None;
        for route in 0..solution.route_count() {
            let pair = (RouteIdx::new(route), RouteIdx::new(route));
            PriorityReplaceOperator::generate_moves(problem, solution, pair, |op| {
                let key = (Reverse(op.priority_gain), op.delta.cost);
                if best.as_ref().map_or(true, |(held, _)| key < *held) {
                    best = Some((key, op));
                }
            });
        }
        if let Some((_, op)) = best {
            debug!(
                evicted = problem.job(op.out_job).id(),
                inserted = problem.job(op.in_job).id(),
                "priority replace"
            );
            op.apply(problem, solution);
            changed = true;
        }

        if !changed {
            return;
        }
    }
}

type ReplaceKey = (Reverse<crate::problem::scale::Priority>, Cost);
