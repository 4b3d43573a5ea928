use crate::problem::{
    job::JobIdx,
    scale::{Cost, Eval},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    eval::{eval_insert, eval_swap_job},
    ls::r#move::LocalSearchOperator,
    solution::route::Route,
    solution::{route_id::RouteIdx, solution_state::SolutionState},
};

/// Gap candidates kept per job when scouting re-insertion points.
const CANDIDATE_GAPS: usize = 3;

/// **SwapStar**
///
/// Exchanges one job of route A against one job of route B, letting each
/// land at its own best position rather than the vacated one. The position
/// scout keeps the cheapest plain-insertion gaps plus the direct swap spot,
/// then prices those exactly against the route with the partner removed.
#[derive(Debug, Clone)]
pub struct SwapStarOperator {
    pub route_a: RouteIdx,
    pub rank_a: usize,
    pub job_a: JobIdx,
    pub to_gap_b: usize,
    pub route_b: RouteIdx,
    pub rank_b: usize,
    pub job_b: JobIdx,
    pub to_gap_a: usize,
    pub delta: Eval,
}

/// Cheapest `CANDIDATE_GAPS` insertion gaps of `job` in `route`, ignoring any
/// interplay with removals; exact pricing happens per candidate afterwards.
fn candidate_gaps(
    problem: &VehicleRoutingProblem,
    route: &Route,
    job: JobIdx,
) -> Vec<usize> {
    let mut scored: Vec<(Cost, usize)> = (0..=route.len())
        .filter_map(|gap| eval_insert(problem, route, job, gap).map(|delta| (delta.cost, gap)))
        .collect();
    scored.sort();
    scored.truncate(CANDIDATE_GAPS);
    scored.into_iter().map(|(_, gap)| gap).collect()
}

fn best_swap_in(
    problem: &VehicleRoutingProblem,
    route: &Route,
    out_rank: usize,
    in_job: JobIdx,
    scouted: &[usize],
) -> Option<(usize, Eval)> {
    let mut best: Option<(usize, Eval)> = None;
    let direct = std::iter::once(out_rank);
    for gap in direct.chain(scouted.iter().copied()) {
        if let Some(delta) = eval_swap_job(problem, route, out_rank, in_job, gap) {
            if best.is_none() || delta.cost < best.unwrap().1.cost {
                best = Some((gap, delta));
            }
        }
    }
    best
}

impl LocalSearchOperator for SwapStarOperator {
    const NAME: &'static str = "SwapStar";

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
        if a.is_empty() || b.is_empty() {
            return;
        }

        for rank_a in 0..a.len() {
            let job_a = a.job_at(rank_a);
            if problem.job(job_a).shipment().is_some() || solution.is_fixed(job_a) {
                continue;
            }
            let gaps_in_b = candidate_gaps(problem, b, job_a);

            for rank_b in 0..b.len() {
                let job_b = b.job_at(rank_b);
                if problem.job(job_b).shipment().is_some() || solution.is_fixed(job_b) {
                    continue;
                }

                let Some((to_gap_b, delta_b)) =
                    best_swap_in(problem, b, rank_b, job_a, &gaps_in_b)
                else {
                    continue;
                };
                let gaps_in_a = candidate_gaps(problem, a, job_b);
                let Some((to_gap_a, delta_a)) =
                    best_swap_in(problem, a, rank_a, job_b, &gaps_in_a)
                else {
                    continue;
                };

                consumer(SwapStarOperator {
                    route_a: r1,
                    rank_a,
                    job_a,
                    to_gap_b,
                    route_b: r2,
                    rank_b,
                    job_b,
                    to_gap_a,
                    delta: delta_a + delta_b,
                });
            }
        }
    }

    fn delta(&self) -> Eval {
        self.delta
    }

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        let a = solution.route(self.route_a);
        let b = solution.route(self.route_b);
        if a.rank_of(self.job_a) != Some(self.rank_a)
            || b.rank_of(self.job_b) != Some(self.rank_b)
            || self.to_gap_a > a.len()
            || self.to_gap_b > b.len()
        {
            return false;
        }

        let delta_a = eval_swap_job(problem, a, self.rank_a, self.job_b, self.to_gap_a);
        let delta_b = eval_swap_job(problem, b, self.rank_b, self.job_a, self.to_gap_b);
        match (delta_a, delta_b) {
            (Some(delta_a), Some(delta_b)) => delta_a + delta_b == self.delta,
            _ => false,
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        super::unassigned_exchange::apply_job_swap(
            problem,
            solution,
            self.route_a,
            self.rank_a,
            self.job_b,
            self.to_gap_a,
        );
        super::unassigned_exchange::apply_job_swap(
            problem,
            solution,
            self.route_b,
            self.rank_b,
            self.job_a,
            self.to_gap_b,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.route_a, self.route_b]
    }
}
