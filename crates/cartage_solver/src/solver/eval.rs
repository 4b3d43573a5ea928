//! Pure cost-and-feasibility oracle. Every function here answers "what would
//! this transformation cost, and does it stay feasible" against a [`Route`]
//! without mutating anything; operators consult it, commit through the route
//! mutations, and the applied cost change matches the reported delta exactly.

use crate::problem::{
    amount::Amount,
    job::JobIdx,
    scale::Eval,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::solution::route::Route;

/// Delta of inserting `job` at job gap `gap`, or None when any invariant
/// (capacity, windows, skills, bounds, reachability) would break.
pub fn eval_insert(
    problem: &VehicleRoutingProblem,
    route: &Route,
    job: JobIdx,
    gap: usize,
) -> Option<Eval> {
    eval_replace(problem, route, gap, gap, std::iter::once(job))
}

/// Delta of inserting a shipment pair, with both gaps expressed against the
/// route before either insertion and `pickup_gap <= delivery_gap`.
pub fn eval_insert_pair(
    problem: &VehicleRoutingProblem,
    route: &Route,
    pickup: JobIdx,
    delivery: JobIdx,
    pickup_gap: usize,
    delivery_gap: usize,
) -> Option<Eval> {
    debug_assert!(pickup_gap <= delivery_gap);
    let middle = route.jobs()[pickup_gap..delivery_gap].iter().copied();
    let candidate = std::iter::once(pickup)
        .chain(middle)
        .chain(std::iter::once(delivery));
    eval_replace(problem, route, pickup_gap, delivery_gap, candidate)
}

/// Delta of removing `len` consecutive jobs starting at `rank`. Without
/// triangle-inequality guarantees on the matrices a removal can lengthen the
/// route, so this can report infeasible against the travel bounds.
pub fn eval_remove(
    problem: &VehicleRoutingProblem,
    route: &Route,
    rank: usize,
    len: usize,
) -> Option<Eval> {
    eval_replace(problem, route, rank, rank + len, std::iter::empty())
}

/// Delta of reversing the job segment `[i, j]`. Infeasible when the segment
/// holds both halves of a shipment, whose order the reversal would invert.
pub fn eval_reverse(
    problem: &VehicleRoutingProblem,
    route: &Route,
    i: usize,
    j: usize,
) -> Option<Eval> {
    for rank in i..=j {
        if let Some(partner) = problem.matching_partner(route.job_at(rank)) {
            if route
                .rank_of(partner)
                .is_some_and(|r| i <= r && r <= j)
            {
                return None;
            }
        }
    }
    eval_replace(
        problem,
        route,
        i,
        j + 1,
        route.jobs()[i..=j].iter().rev().copied(),
    )
}

/// Per-route deltas of swapping the segment `[i, i+len_a)` of `route_a` with
/// `[j, j+len_b)` of `route_b`.
#[allow(clippy::too_many_arguments)]
pub fn eval_exchange(
    problem: &VehicleRoutingProblem,
    route_a: &Route,
    i: usize,
    len_a: usize,
    route_b: &Route,
    j: usize,
    len_b: usize,
) -> Option<(Eval, Eval)> {
    let segment_b = route_b.jobs()[j..j + len_b].iter().copied();
    let segment_a = route_a.jobs()[i..i + len_a].iter().copied();
    let delta_a = eval_replace(problem, route_a, i, i + len_a, segment_b)?;
    let delta_b = eval_replace(problem, route_b, j, j + len_b, segment_a)?;
    Some((delta_a, delta_b))
}

/// Core oracle: delta of replacing job ranks `[start, end)` with `candidate`.
///
/// The walk mirrors the route's apply rules for breaks: breaks strictly
/// inside the span move to its leading edge and are taken before the
/// candidate jobs, breaks at the trailing edge are taken after them. Time
/// feasibility downstream of the span is settled against the cached
/// latest-start envelope, so a single insertion costs O(1) and a span walk
/// costs O(span).
pub fn eval_replace(
    problem: &VehicleRoutingProblem,
    route: &Route,
    start: usize,
    end: usize,
    candidate: impl Iterator<Item = JobIdx> + Clone,
) -> Option<Eval> {
    let vehicle = route.vehicle(problem);
    let travel = problem.travel(route.vehicle_idx());
    let service_type = vehicle.service_type();
    let capacity = vehicle.capacity();
    let dims = problem.amount_dimensions();

    // Candidate totals; skills are checked on the way.
    let mut cand_initial = Amount::zeros(dims);
    let mut cand_delivery = Amount::zeros(dims);
    let mut cand_pickup = Amount::zeros(dims);
    let mut cand_len = 0usize;
    for job_idx in candidate.clone() {
        let job = problem.job(job_idx);
        if !vehicle.can_serve(job) {
            return None;
        }
        if !job.is_delivery() {
            cand_initial += job.delivery();
        }
        cand_delivery += job.delivery();
        cand_pickup += job.pickup();
        cand_len += 1;
    }

    let new_len = route.len() - (end - start) + cand_len;
    if new_len > vehicle.max_tasks() {
        return None;
    }

    let mut delta_initial = cand_initial;
    let mut delta_delivery = cand_delivery;
    let mut delta_pickup = cand_pickup;
    for rank in start..end {
        let job = problem.job(route.job_at(rank));
        if !job.is_delivery() {
            delta_initial -= job.delivery();
        }
        delta_delivery -= job.delivery();
        delta_pickup -= job.pickup();
    }

    // Loads before the span rise by the initial-load delta, loads after it by
    // the net flow delta; peaks settle both stretches in O(1).
    if !(route.fwd_peak(start) + &delta_initial).fits_in(capacity) {
        return None;
    }
    let mut delta_after = delta_initial.clone();
    delta_after -= &delta_delivery;
    delta_after += &delta_pickup;
    if !(route.bwd_peak(end) + &delta_after).fits_in(capacity) {
        return None;
    }

    for &(b, gap) in route.break_gaps() {
        if gap <= start {
            let load = route.load_at(gap) + &delta_initial;
            if !problem.break_at(b).load_is_admissible(&load) {
                return None;
            }
        } else if gap > end {
            let load = route.load_at(gap) + &delta_after;
            if !problem.break_at(b).load_is_admissible(&load) {
                return None;
            }
        }
    }

    // Fully emptied route: all old legs disappear, nothing to walk.
    if new_len == 0 {
        let delta = -old_span_edges(problem, route, start, end);
        let mut eval = delta;
        if !route.is_empty() {
            eval.cost -= vehicle.costs().scaled_fixed();
        }
        return Some(eval);
    }

    // Forward walk over the span: moved breaks, candidate jobs, trailing
    // breaks, then the rejoin bound.
    let mut t = route.departure_before_gap(problem, start);
    let mut prev_loc = route.location_before_gap(problem, start);
    let mut load = route.load_at(start) + &delta_initial;
    let mut new_edges = Eval::ZERO;

    for &(b, gap) in route.break_gaps() {
        if gap > start && gap < end {
            let br = problem.break_at(b);
            if !br.load_is_admissible(&load) {
                return None;
            }
            let break_start = br.tws().earliest_start_from(t)?;
            t = break_start + br.service();
        }
    }

    for job_idx in candidate {
        let job = problem.job(job_idx);
        let (travel_in, edge) = match prev_loc {
            Some(from) => {
                if !travel.is_reachable(from, job.location()) {
                    return None;
                }
                (travel.duration(from, job.location()), travel.eval(from, job.location()))
            }
            None => (0, Eval::ZERO),
        };
        new_edges += edge;

        let arrival = t + travel_in;
        let setup = if prev_loc == Some(job.location()) {
            0
        } else {
            job.setup()
        };
        let service_start = job.tws().earliest_start_from(arrival + setup)?;
        t = service_start + job.service_for(service_type);
        prev_loc = Some(job.location());

        load -= job.delivery();
        load += job.pickup();
        if !load.fits_in(capacity) {
            return None;
        }
    }

    if end > start {
        for &(b, gap) in route.break_gaps() {
            if gap == end {
                let br = problem.break_at(b);
                if !br.load_is_admissible(&load) {
                    return None;
                }
                let break_start = br.tws().earliest_start_from(t)?;
                t = break_start + br.service();
            }
        }
    }

    if end < route.len() {
        let next_loc = route.location_at(problem, end);
        match prev_loc {
            Some(from) => {
                if !travel.is_reachable(from, next_loc) {
                    return None;
                }
                new_edges += travel.eval(from, next_loc);
                let arrival = t + travel.duration(from, next_loc);
                let setup = if prev_loc == Some(next_loc) {
                    0
                } else {
                    problem.job(route.job_at(end)).setup()
                };
                if arrival + setup > route.latest_start_of(end) {
                    return None;
                }
            }
            None => {
                // No start location and nothing before `end`: the suffix only
                // moves earlier, which the windows absorb as waiting.
            }
        }
    } else {
        match (vehicle.end(), prev_loc) {
            (Some(end_loc), Some(from)) => {
                if !travel.is_reachable(from, end_loc) {
                    return None;
                }
                new_edges += travel.eval(from, end_loc);
                if t + travel.duration(from, end_loc) > vehicle.tw().end {
                    return None;
                }
            }
            _ => {
                if t > vehicle.tw().end {
                    return None;
                }
            }
        }
    }

    let delta = new_edges - old_span_edges(problem, route, start, end);

    if route.travel_eval().duration + delta.duration > vehicle.max_travel_time() {
        return None;
    }
    if route.travel_eval().distance + delta.distance > vehicle.max_distance() {
        return None;
    }

    let mut eval = delta;
    if route.is_empty() && new_len > 0 {
        eval.cost += vehicle.costs().scaled_fixed();
    }

    Some(eval)
}

/// Delta of removing the job at `rank` and placing `replacement` at gap
/// `target` (expressed in the ranks of the unmodified route), as one exact
/// span evaluation.
pub fn eval_swap_job(
    problem: &VehicleRoutingProblem,
    route: &Route,
    rank: usize,
    replacement: JobIdx,
    target: usize,
) -> Option<Eval> {
    if target <= rank {
        let middle = route.jobs()[target..rank].iter().copied();
        eval_replace(
            problem,
            route,
            target,
            rank + 1,
            std::iter::once(replacement).chain(middle),
        )
    } else {
        let middle = route.jobs()[rank + 1..target].iter().copied();
        eval_replace(
            problem,
            route,
            rank,
            target,
            middle.chain(std::iter::once(replacement)),
        )
    }
}

/// Delta of moving the segment `[from, from+len)` to gap `to` within the
/// same route; `to` lies outside the segment and is expressed in the ranks
/// of the unmodified route.
pub fn eval_move_segment_within(
    problem: &VehicleRoutingProblem,
    route: &Route,
    from: usize,
    len: usize,
    to: usize,
) -> Option<Eval> {
    debug_assert!(to <= from || to >= from + len);
    if to <= from {
        let segment = route.jobs()[from..from + len].iter().copied();
        let middle = route.jobs()[to..from].iter().copied();
        eval_replace(problem, route, to, from + len, segment.chain(middle))
    } else {
        let segment = route.jobs()[from..from + len].iter().copied();
        let middle = route.jobs()[from + len..to].iter().copied();
        eval_replace(problem, route, from, to, middle.chain(segment))
    }
}

/// Sum of the travel legs the span `[start, end)` currently occupies,
/// including the legs joining it to its surroundings.
fn old_span_edges(
    problem: &VehicleRoutingProblem,
    route: &Route,
    start: usize,
    end: usize,
) -> Eval {
    let travel = problem.travel(route.vehicle_idx());
    let before = route.location_before_gap(problem, start);
    let after = route.location_after_gap(problem, end);

    let mut edges = Eval::ZERO;
    if start == end {
        if let (Some(a), Some(b)) = (before, after) {
            edges += travel.eval(a, b);
        }
        return edges;
    }

    if let Some(a) = before {
        edges += travel.eval(a, route.location_at(problem, start));
    }
    for k in start..end - 1 {
        edges += travel.eval(
            route.location_at(problem, k),
            route.location_at(problem, k + 1),
        );
    }
    if let Some(b) = after {
        edges += travel.eval(route.location_at(problem, end - 1), b);
    }
    edges
}
