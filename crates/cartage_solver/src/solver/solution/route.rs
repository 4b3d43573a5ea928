use fxhash::FxHashMap;

use crate::problem::{
    amount::Amount,
    breaks::BreakIdx,
    job::JobIdx,
    location::LocationIdx,
    scale::{Cost, Duration, Eval, INFINITE_COST},
    vehicle::{Vehicle, VehicleIdx},
    vehicle_routing_problem::VehicleRoutingProblem,
};

/// An atomic route element between the vehicle start and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Job(JobIdx),
    Break(BreakIdx),
}

/// Earliest-schedule data for one step, filled by the forward sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepSchedule {
    pub arrival: Duration,
    /// Service start, past waiting and setup.
    pub start: Duration,
    pub departure: Duration,
    /// Setup actually charged; zero when the previous step shares the
    /// location.
    pub setup: Duration,
    /// Travel duration of the leg into this step; zero for breaks.
    pub travel_in: Duration,
    /// Latest feasible service start keeping the route suffix feasible,
    /// filled by the backward sweep.
    pub latest_start: Duration,
}

/// Ordered sequence of steps assigned to one vehicle, with the caches that
/// make feasibility queries cheap: an earliest/latest schedule envelope per
/// step, load prefix peaks per job rank, and running travel totals.
///
/// Operators address job ranks; breaks hold a gap rank (the number of jobs
/// preceding them) and are re-slotted on rebuild. Breaks have no location, so
/// travel cost, duration and distance depend on the job sequence alone.
#[derive(Clone)]
pub struct Route {
    vehicle: VehicleIdx,

    /// Job-only sequence, the operators' view.
    jobs: Vec<JobIdx>,
    ranks: FxHashMap<JobIdx, usize>,

    /// Vehicle breaks with their gap rank, kept sorted by gap.
    break_gaps: Vec<(BreakIdx, usize)>,
    /// Breaks that could not be slotted feasibly (forced routes only).
    missing_breaks: Vec<BreakIdx>,

    /// Full step sequence derived from `jobs` and `break_gaps`.
    steps: Vec<Step>,
    /// Step index of each job rank.
    job_steps: Vec<usize>,

    schedule: Vec<StepSchedule>,
    /// Departure from the vehicle start location (or first-step time).
    start_time: Duration,
    /// Arrival at the vehicle end location (or last departure).
    end_time: Duration,
    time_feasible: bool,

    /// current_load[r] is the load carried after the first `r` jobs;
    /// current_load[0] is the initial load (the sum of all deliveries).
    current_load: Vec<Amount>,
    /// fwd_peak[r] = component-wise max of current_load[0..=r].
    fwd_peak: Vec<Amount>,
    /// bwd_peak[r] = component-wise max of current_load[r..].
    bwd_peak: Vec<Amount>,

    /// Sum of travel cost / duration / distance over all legs.
    travel: Eval,
    service_sum: Duration,
    setup_sum: Duration,
}

impl Route {
    pub fn empty(problem: &VehicleRoutingProblem, vehicle: VehicleIdx) -> Self {
        let breaks = problem.vehicle(vehicle).breaks();
        let mut route = Route {
            vehicle,
            jobs: Vec::new(),
            ranks: FxHashMap::default(),
            break_gaps: breaks.iter().map(|&b| (b, 0)).collect(),
            missing_breaks: Vec::new(),
            steps: Vec::new(),
            job_steps: Vec::new(),
            schedule: Vec::new(),
            start_time: 0,
            end_time: 0,
            time_feasible: true,
            current_load: Vec::new(),
            fwd_peak: Vec::new(),
            bwd_peak: Vec::new(),
            travel: Eval::ZERO,
            service_sum: 0,
            setup_sum: 0,
        };
        route.rebuild(problem);
        route
    }

    pub fn vehicle_idx(&self) -> VehicleIdx {
        self.vehicle
    }

    pub fn vehicle<'a>(&self, problem: &'a VehicleRoutingProblem) -> &'a Vehicle {
        problem.vehicle(self.vehicle)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[JobIdx] {
        &self.jobs
    }

    pub fn job_at(&self, rank: usize) -> JobIdx {
        self.jobs[rank]
    }

    pub fn rank_of(&self, job: JobIdx) -> Option<usize> {
        self.ranks.get(&job).copied()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_schedule(&self, step: usize) -> &StepSchedule {
        &self.schedule[step]
    }

    pub fn missing_breaks(&self) -> &[BreakIdx] {
        &self.missing_breaks
    }

    pub fn break_gaps(&self) -> &[(BreakIdx, usize)] {
        &self.break_gaps
    }

    pub fn is_time_feasible(&self) -> bool {
        self.time_feasible
    }

    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    pub fn end_time(&self) -> Duration {
        self.end_time
    }

    pub fn travel_eval(&self) -> Eval {
        self.travel
    }

    pub fn service_sum(&self) -> Duration {
        self.service_sum
    }

    pub fn setup_sum(&self) -> Duration {
        self.setup_sum
    }

    pub fn waiting_sum(&self) -> Duration {
        self.schedule
            .iter()
            .map(|s| s.start - s.setup - s.arrival)
            .sum()
    }

    pub fn fixed_cost(&self, problem: &VehicleRoutingProblem) -> Cost {
        if self.jobs.is_empty() {
            0
        } else {
            self.vehicle(problem).costs().scaled_fixed()
        }
    }

    pub fn cost(&self, problem: &VehicleRoutingProblem) -> Cost {
        self.fixed_cost(problem) + self.travel.cost
    }

    pub fn initial_load(&self) -> &Amount {
        &self.current_load[0]
    }

    /// Load carried after the first `rank` jobs.
    pub fn load_at(&self, rank: usize) -> &Amount {
        &self.current_load[rank]
    }

    pub fn fwd_peak(&self, rank: usize) -> &Amount {
        &self.fwd_peak[rank]
    }

    pub fn bwd_peak(&self, rank: usize) -> &Amount {
        &self.bwd_peak[rank]
    }

    pub fn max_load(&self) -> &Amount {
        &self.fwd_peak[self.jobs.len()]
    }

    /// Location of the job at `rank`.
    pub fn location_at(&self, problem: &VehicleRoutingProblem, rank: usize) -> LocationIdx {
        problem.job(self.jobs[rank]).location()
    }

    /// Effective location preceding job gap `rank`: the previous job's
    /// location, or the vehicle start.
    pub fn location_before_gap(
        &self,
        problem: &VehicleRoutingProblem,
        gap: usize,
    ) -> Option<LocationIdx> {
        if gap == 0 {
            self.vehicle(problem).start()
        } else {
            Some(self.location_at(problem, gap - 1))
        }
    }

    /// Effective location following job gap `rank`: the next job's location,
    /// or the vehicle end.
    pub fn location_after_gap(
        &self,
        problem: &VehicleRoutingProblem,
        gap: usize,
    ) -> Option<LocationIdx> {
        if gap < self.jobs.len() {
            Some(self.location_at(problem, gap))
        } else {
            self.vehicle(problem).end()
        }
    }

    /// Departure time of the step immediately preceding job gap `gap`
    /// (possibly a break), or the schedule origin for an empty prefix.
    pub fn departure_before_gap(&self, problem: &VehicleRoutingProblem, gap: usize) -> Duration {
        let step = if gap < self.jobs.len() {
            self.job_steps[gap]
        } else {
            self.steps.len()
        };
        if step == 0 {
            self.vehicle(problem).tw().start
        } else {
            self.schedule[step - 1].departure
        }
    }

    /// Latest service start of the job at `rank` keeping the suffix feasible.
    pub fn latest_start_of(&self, rank: usize) -> Duration {
        self.schedule[self.job_steps[rank]].latest_start
    }

    /// True when every shipment job in `[start, end)` has its partner inside
    /// the same range; such a segment can move between routes as a unit.
    pub fn segment_is_self_contained(
        &self,
        problem: &VehicleRoutingProblem,
        start: usize,
        end: usize,
    ) -> bool {
        self.jobs[start..end].iter().all(|&job| {
            match problem.matching_partner(job) {
                Some(partner) => {
                    let rank = self.ranks[&partner];
                    start <= rank && rank < end
                }
                None => true,
            }
        })
    }

    /// True when no shipment job lives in `[start, end)`.
    pub fn segment_has_no_shipments(
        &self,
        problem: &VehicleRoutingProblem,
        start: usize,
        end: usize,
    ) -> bool {
        self.jobs[start..end]
            .iter()
            .all(|&job| problem.job(job).shipment().is_none())
    }

    // ---- mutations ----

    pub fn insert(&mut self, problem: &VehicleRoutingProblem, rank: usize, job: JobIdx) {
        self.jobs.insert(rank, job);
        for gap in self.break_gaps.iter_mut().map(|(_, g)| g) {
            if *gap > rank {
                *gap += 1;
            }
        }
        self.rebuild(problem);
    }

    /// Inserts a shipment pair with the delivery gap expressed relative to
    /// the route before either insertion. Breaks strictly inside the spanned
    /// range move to the pickup gap, the rule shared with `replace`.
    pub fn insert_pair(
        &mut self,
        problem: &VehicleRoutingProblem,
        pickup_rank: usize,
        pickup: JobIdx,
        delivery_rank: usize,
        delivery: JobIdx,
    ) {
        debug_assert!(pickup_rank <= delivery_rank);
        self.jobs.insert(pickup_rank, pickup);
        self.jobs.insert(delivery_rank + 1, delivery);
        for gap in self.break_gaps.iter_mut().map(|(_, g)| g) {
            if *gap > delivery_rank || (*gap == delivery_rank && delivery_rank > pickup_rank) {
                *gap += 2;
            } else if *gap > pickup_rank {
                *gap = pickup_rank;
            }
        }
        self.break_gaps.sort_by_key(|&(_, g)| g);
        self.rebuild(problem);
    }

    pub fn remove(&mut self, problem: &VehicleRoutingProblem, rank: usize, len: usize) {
        self.jobs.drain(rank..rank + len);
        for gap in self.break_gaps.iter_mut().map(|(_, g)| g) {
            if *gap > rank + len {
                *gap -= len;
            } else if *gap > rank {
                *gap = rank;
            }
        }
        self.rebuild(problem);
    }

    pub fn replace(
        &mut self,
        problem: &VehicleRoutingProblem,
        start: usize,
        end: usize,
        replacement: &[JobIdx],
    ) {
        let removed = end - start;
        let added = replacement.len();
        self.jobs.splice(start..end, replacement.iter().copied());
        for gap in self.break_gaps.iter_mut().map(|(_, g)| g) {
            if removed == 0 {
                // Pure insertion: breaks at the gap stay ahead of the new
                // jobs, matching the evaluator's walk.
                if *gap > start {
                    *gap += added;
                }
            } else if *gap >= end {
                *gap = *gap + added - removed;
            } else if *gap > start {
                // Strictly inside the span: move to its leading edge.
                *gap = start;
            }
        }
        self.break_gaps.sort_by_key(|&(_, g)| g);
        self.rebuild(problem);
    }

    /// Reverses the job segment `[i, j]`; breaks inside move to the segment
    /// start gap.
    pub fn reverse(&mut self, problem: &VehicleRoutingProblem, i: usize, j: usize) {
        self.jobs[i..=j].reverse();
        for gap in self.break_gaps.iter_mut().map(|(_, g)| g) {
            if *gap > i && *gap <= j {
                *gap = i;
            }
        }
        self.rebuild(problem);
    }

    /// Installs a user-forced layout wholesale. Vehicle breaks absent from
    /// `break_gaps` are prepended at the route head; the rebuild may still
    /// re-slot breaks when the requested layout admits no schedule.
    pub fn force_layout(
        &mut self,
        problem: &VehicleRoutingProblem,
        jobs: Vec<JobIdx>,
        mut break_gaps: Vec<(BreakIdx, usize)>,
    ) {
        for &b in self.vehicle(problem).breaks() {
            if !break_gaps.iter().any(|&(listed, _)| listed == b) {
                break_gaps.push((b, 0));
            }
        }
        break_gaps.sort_by_key(|&(_, g)| g);
        self.jobs = jobs;
        self.break_gaps = break_gaps;
        self.rebuild(problem);
    }

    // ---- cache rebuild ----

    pub fn rebuild(&mut self, problem: &VehicleRoutingProblem) {
        self.ranks.clear();
        self.ranks
            .extend(self.jobs.iter().enumerate().map(|(rank, &job)| (job, rank)));

        self.rebuild_loads(problem);
        self.slot_breaks(problem);
        self.assemble_steps();
        self.rebuild_schedule(problem);
        self.rebuild_travel(problem);
    }

    fn rebuild_loads(&mut self, problem: &VehicleRoutingProblem) {
        let n = self.jobs.len();
        let dims = problem.amount_dimensions();

        self.current_load.clear();
        self.current_load.reserve(n + 1);

        // Initial load: single-job deliveries are on board from the start;
        // shipment amounts only ride between their pickup and delivery.
        let mut load = Amount::zeros(dims);
        for &job in &self.jobs {
            let j = problem.job(job);
            if !j.is_delivery() {
                load += j.delivery();
            }
        }
        self.current_load.push(load.clone());
        for &job in &self.jobs {
            let j = problem.job(job);
            load -= j.delivery();
            load += j.pickup();
            self.current_load.push(load.clone());
        }

        self.fwd_peak.clear();
        self.fwd_peak.reserve(n + 1);
        let mut peak = self.current_load[0].clone();
        for l in &self.current_load {
            peak.update_max(l);
            self.fwd_peak.push(peak.clone());
        }

        self.bwd_peak.clear();
        self.bwd_peak.resize(n + 1, Amount::zeros(dims));
        let mut peak = self.current_load[n].clone();
        for r in (0..=n).rev() {
            peak.update_max(&self.current_load[r]);
            self.bwd_peak[r] = peak.clone();
        }
    }

    /// Keeps breaks at their pinned gaps when the resulting schedule stays
    /// feasible, which is the invariant the evaluator relies on. When the
    /// pinned layout fails (forced routes, shifted windows), a greedy repair
    /// re-slots each break at the gap minimizing (end time, waiting, gap);
    /// breaks that fit nowhere are reported missing.
    fn slot_breaks(&mut self, problem: &VehicleRoutingProblem) {
        self.missing_breaks.clear();
        if self.break_gaps.is_empty() {
            return;
        }

        let n = self.jobs.len();
        for gap in self.break_gaps.iter_mut().map(|(_, g)| g) {
            *gap = (*gap).min(n);
        }

        if self.simulate_steps(problem, &self.break_gaps).is_some() {
            return;
        }

        let pinned = std::mem::take(&mut self.break_gaps);
        let mut placed: Vec<(BreakIdx, usize)> = Vec::with_capacity(pinned.len());

        for &(b, _) in &pinned {
            let mut best: Option<(Duration, Duration, usize)> = None;

            for gap in 0..=n {
                placed.push((b, gap));
                placed.sort_by_key(|&(_, g)| g);
                if let Some(outcome) = self.simulate_steps(problem, &placed) {
                    let key = (outcome.end_time, outcome.waiting, gap);
                    if best.is_none() || key < best.unwrap() {
                        best = Some(key);
                    }
                }
                placed.retain(|&(candidate, _)| candidate != b);
            }

            match best {
                Some((_, _, gap)) => {
                    placed.push((b, gap));
                    placed.sort_by_key(|&(_, g)| g);
                }
                None => self.missing_breaks.push(b),
            }
        }

        self.break_gaps = placed;
    }

    fn assemble_steps(&mut self) {
        self.steps.clear();
        self.job_steps.clear();

        let mut break_iter = self.break_gaps.iter().peekable();
        for (rank, &job) in self.jobs.iter().enumerate() {
            while let Some(&&(b, gap)) = break_iter.peek() {
                if gap <= rank {
                    self.steps.push(Step::Break(b));
                    break_iter.next();
                } else {
                    break;
                }
            }
            self.job_steps.push(self.steps.len());
            self.steps.push(Step::Job(job));
        }
        for &(b, _) in break_iter {
            self.steps.push(Step::Break(b));
        }
    }

    /// Forward earliest sweep, start shift, and backward latest sweep.
    fn rebuild_schedule(&mut self, problem: &VehicleRoutingProblem) {
        let vehicle = self.vehicle(problem);
        let travel = problem.travel(self.vehicle);
        let service_type = vehicle.service_type();
        let vehicle_tw = *vehicle.tw();
        let vehicle_start = vehicle.start();
        let vehicle_end = vehicle.end();

        self.schedule.clear();
        self.schedule.resize(self.steps.len(), StepSchedule::default());
        self.time_feasible = true;

        if self.steps.is_empty() {
            self.start_time = vehicle_tw.start;
            self.end_time = vehicle_tw.start;
            return;
        }

        let mut t = vehicle_tw.start;
        let mut prev_loc = vehicle_start;

        for (idx, &step) in self.steps.iter().enumerate() {
            let slot = &mut self.schedule[idx];
            match step {
                Step::Job(j) => {
                    let job = problem.job(j);
                    let travel_in = match prev_loc {
                        Some(from) => travel.duration(from, job.location()),
                        None => 0,
                    };
                    if travel_in >= INFINITE_COST {
                        self.time_feasible = false;
                    }
                    // Clamped so repeated unreachable legs cannot overflow
                    // the clamped reporting walk.
                    let arrival = t.saturating_add(travel_in).min(INFINITE_COST);
                    let setup = if prev_loc == Some(job.location()) {
                        0
                    } else {
                        job.setup()
                    };
                    let ready = arrival + setup;
                    let start = match job.tws().earliest_start_from(ready) {
                        Some(start) => start,
                        None => {
                            self.time_feasible = false;
                            ready.max(job.tws().last().start)
                        }
                    };
                    let departure = start + job.service_for(service_type);

                    slot.arrival = arrival;
                    slot.start = start;
                    slot.departure = departure;
                    slot.setup = setup;
                    slot.travel_in = travel_in;

                    t = departure;
                    prev_loc = Some(job.location());
                }
                Step::Break(b) => {
                    let br = problem.break_at(b);
                    let start = match br.tws().earliest_start_from(t) {
                        Some(start) => start,
                        None => {
                            self.time_feasible = false;
                            t.max(br.tws().last().start)
                        }
                    };
                    let departure = start + br.service();

                    slot.arrival = t;
                    slot.start = start;
                    slot.departure = departure;
                    slot.setup = 0;
                    slot.travel_in = 0;

                    t = departure;
                }
            }
        }

        // Shift the departure from start so the vehicle does not wait at its
        // first stop.
        let first = &self.schedule[0];
        let shifted_arrival = first.start - first.setup;
        let travel_out = first.travel_in;
        self.schedule[0].arrival = shifted_arrival;
        self.start_time = shifted_arrival - travel_out;

        let last_departure = self.schedule[self.steps.len() - 1].departure;
        self.end_time = match (vehicle_end, prev_loc) {
            (Some(end), Some(from)) => {
                let leg = travel.duration(from, end);
                if leg >= INFINITE_COST {
                    self.time_feasible = false;
                }
                last_departure.saturating_add(leg).min(INFINITE_COST)
            }
            _ => last_departure,
        };
        if self.end_time > vehicle_tw.end {
            self.time_feasible = false;
        }

        // Backward latest sweep; only meaningful on feasible schedules.
        if !self.time_feasible {
            for slot in self.schedule.iter_mut() {
                slot.latest_start = slot.start;
            }
            return;
        }

        let mut allowed_departure = match (vehicle_end, prev_loc) {
            (Some(end), Some(from)) => vehicle_tw.end - travel.duration(from, end),
            _ => vehicle_tw.end,
        };

        for idx in (0..self.steps.len()).rev() {
            let (service, tws) = match self.steps[idx] {
                Step::Job(j) => {
                    let job = problem.job(j);
                    (job.service_for(service_type), job.tws())
                }
                Step::Break(b) => {
                    let br = problem.break_at(b);
                    (br.service(), br.tws())
                }
            };

            let latest_start = tws
                .latest_start_until(allowed_departure - service)
                .unwrap_or(self.schedule[idx].start);
            debug_assert!(latest_start >= self.schedule[idx].start);
            self.schedule[idx].latest_start = latest_start;

            let setup = self.schedule[idx].setup;
            let travel_in = self.schedule[idx].travel_in;
            allowed_departure = latest_start - setup - travel_in;
        }
    }

    fn rebuild_travel(&mut self, problem: &VehicleRoutingProblem) {
        let vehicle = self.vehicle(problem);
        let travel = problem.travel(self.vehicle);
        let service_type = vehicle.service_type();

        self.travel = Eval::ZERO;
        self.service_sum = 0;
        self.setup_sum = 0;

        if self.jobs.is_empty() {
            return;
        }

        if let Some(start) = vehicle.start() {
            self.travel += travel.eval(start, self.location_at(problem, 0));
        }
        for pair in 0..self.jobs.len().saturating_sub(1) {
            self.travel += travel.eval(
                self.location_at(problem, pair),
                self.location_at(problem, pair + 1),
            );
        }
        if let Some(end) = vehicle.end() {
            self.travel += travel.eval(self.location_at(problem, self.jobs.len() - 1), end);
        }

        for &job in &self.jobs {
            self.service_sum += problem.job(job).service_for(service_type);
        }
        for slot in &self.schedule {
            self.setup_sum += slot.setup;
        }
    }

    /// Forward-simulates the current job sequence with breaks at the given
    /// gaps; returns end time and waiting on success, None when infeasible.
    pub(crate) fn simulate_steps(
        &self,
        problem: &VehicleRoutingProblem,
        break_gaps: &[(BreakIdx, usize)],
    ) -> Option<SimulatedSchedule> {
        simulate_sequence(problem, self.vehicle, &self.jobs, break_gaps)
    }
}

/// Outcome of a forward simulation over a candidate sequence.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedSchedule {
    pub end_time: Duration,
    pub waiting: Duration,
}

/// Walks a candidate job sequence for `vehicle` with breaks pinned at the
/// given gaps, returning None as soon as a time window, break window or
/// break max-load admits no feasible schedule.
pub(crate) fn simulate_sequence(
    problem: &VehicleRoutingProblem,
    vehicle_idx: VehicleIdx,
    jobs: &[JobIdx],
    break_gaps: &[(BreakIdx, usize)],
) -> Option<SimulatedSchedule> {
    let vehicle = problem.vehicle(vehicle_idx);
    let travel = problem.travel(vehicle_idx);
    let service_type = vehicle.service_type();

    let mut t = vehicle.tw().start;
    let mut prev_loc = vehicle.start();
    let mut waiting = 0;

    let dims = problem.amount_dimensions();
    let mut load = Amount::zeros(dims);
    for &job in jobs {
        let j = problem.job(job);
        if !j.is_delivery() {
            load += j.delivery();
        }
    }

    let mut breaks = break_gaps.iter().peekable();

    for (rank, &job_idx) in jobs.iter().enumerate() {
        while let Some(&&(b, gap)) = breaks.peek() {
            if gap <= rank {
                let br = problem.break_at(b);
                if !br.load_is_admissible(&load) {
                    return None;
                }
                let start = br.tws().earliest_start_from(t)?;
                waiting += start - t;
                t = start + br.service();
                breaks.next();
            } else {
                break;
            }
        }

        let job = problem.job(job_idx);
        let travel_in = match prev_loc {
            Some(from) => travel.duration(from, job.location()),
            None => 0,
        };
        if travel_in >= INFINITE_COST {
            return None;
        }
        let arrival = t + travel_in;
        let setup = if prev_loc == Some(job.location()) {
            0
        } else {
            job.setup()
        };
        let ready = arrival + setup;
        let start = job.tws().earliest_start_from(ready)?;
        waiting += start - ready;
        t = start + job.service_for(service_type);
        prev_loc = Some(job.location());

        load -= job.delivery();
        load += job.pickup();
    }

    for &(b, _) in breaks {
        let br = problem.break_at(b);
        if !br.load_is_admissible(&load) {
            return None;
        }
        let start = br.tws().earliest_start_from(t)?;
        waiting += start - t;
        t = start + br.service();
    }

    let end_time = match (vehicle.end(), prev_loc) {
        (Some(end), Some(from)) => {
            let leg = travel.duration(from, end);
            if leg >= INFINITE_COST {
                return None;
            }
            t + leg
        }
        _ => t,
    };

    if end_time > vehicle.tw().end {
        return None;
    }

    Some(SimulatedSchedule { end_time, waiting })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::scale::DURATION_FACTOR;
    use crate::test_utils;

    fn delivery_problem() -> std::sync::Arc<VehicleRoutingProblem> {
        // Travel between neighboring ranks takes 300 s; vehicle loops from
        // rank 0 with capacity 40.
        test_utils::problem(&format!(
            r#"{{
                "vehicles": [{{
                    "id": 1, "start_index": 0, "end_index": 0,
                    "capacity": [40],
                    "time_window": [0, 100000]
                }}],
                "jobs": [
                    {{"id": 1, "location_index": 1, "delivery": [10], "service": 60}},
                    {{"id": 2, "location_index": 2, "delivery": [20], "service": 60}},
                    {{"id": 3, "location_index": 3, "pickup": [10], "service": 60}}
                ],
                "matrix": {}
            }}"#,
            test_utils::corridor_matrix(4, 300)
        ))
    }

    #[test]
    fn test_load_profile_and_peaks() {
        let problem = delivery_problem();
        let mut route = Route::empty(&problem, VehicleIdx::new(0));

        route.insert(&problem, 0, JobIdx::new(0));
        route.insert(&problem, 1, JobIdx::new(1));
        route.insert(&problem, 2, JobIdx::new(2));

        // Initial load carries both deliveries; the pickup accrues at the
        // end.
        assert_eq!(route.initial_load(), &Amount::from_vec(vec![30]));
        assert_eq!(route.load_at(1), &Amount::from_vec(vec![20]));
        assert_eq!(route.load_at(2), &Amount::from_vec(vec![0]));
        assert_eq!(route.load_at(3), &Amount::from_vec(vec![10]));

        assert_eq!(route.fwd_peak(0), &Amount::from_vec(vec![30]));
        assert_eq!(route.fwd_peak(3), &Amount::from_vec(vec![30]));
        assert_eq!(route.bwd_peak(2), &Amount::from_vec(vec![10]));
        assert_eq!(route.max_load(), &Amount::from_vec(vec![30]));
    }

    #[test]
    fn test_schedule_sweep() {
        let problem = delivery_problem();
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));
        route.insert(&problem, 1, JobIdx::new(1));

        assert!(route.is_time_feasible());

        // Rank 0 -> rank 1 takes 300 s, service 60 s, then 300 s to rank 2.
        let first = route.step_schedule(0);
        assert_eq!(first.arrival, 300 * DURATION_FACTOR);
        assert_eq!(first.departure, 360 * DURATION_FACTOR);
        let second = route.step_schedule(1);
        assert_eq!(second.arrival, 660 * DURATION_FACTOR);

        // Return leg to rank 0.
        assert_eq!(route.end_time(), (660 + 60 + 600) * DURATION_FACTOR);
        assert_eq!(route.travel_eval().duration, (300 + 300 + 600) * DURATION_FACTOR);
    }

    #[test]
    fn test_latest_start_envelope() {
        let problem = delivery_problem();
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));
        route.insert(&problem, 1, JobIdx::new(1));

        // Vehicle window closes at 100000 s; the return leg and services
        // bound every latest start from behind.
        let last = route.step_schedule(1);
        assert_eq!(last.latest_start, (100_000 - 600 - 60) * DURATION_FACTOR);
        let first = route.step_schedule(0);
        assert_eq!(
            first.latest_start,
            (100_000 - 600 - 60 - 300 - 60) * DURATION_FACTOR
        );
        assert!(first.latest_start >= first.start);
    }

    #[test]
    fn test_remove_and_replace() {
        let problem = delivery_problem();
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));
        route.insert(&problem, 1, JobIdx::new(1));
        route.insert(&problem, 2, JobIdx::new(2));

        route.remove(&problem, 1, 1);
        assert_eq!(route.jobs(), &[JobIdx::new(0), JobIdx::new(2)]);
        assert_eq!(route.rank_of(JobIdx::new(2)), Some(1));

        route.replace(&problem, 0, 2, &[JobIdx::new(2), JobIdx::new(0)]);
        assert_eq!(route.jobs(), &[JobIdx::new(2), JobIdx::new(0)]);

        route.reverse(&problem, 0, 1);
        assert_eq!(route.jobs(), &[JobIdx::new(0), JobIdx::new(2)]);
    }

    #[test]
    fn test_infeasible_window_is_flagged() {
        let problem = test_utils::problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "time_window": [0, 200]}],
                "jobs": [{"id": 1, "location_index": 1, "time_windows": [[0, 100]]}],
                "matrix": [[0, 300], [300, 0]]
            }"#,
        );
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));

        // Arrival at 300 s is past the job window and the vehicle end.
        assert!(!route.is_time_feasible());
    }

    #[test]
    fn test_break_is_scheduled_between_jobs() {
        let problem = test_utils::problem(&format!(
            r#"{{
                "vehicles": [{{
                    "id": 1, "start_index": 0,
                    "time_window": [0, 10000],
                    "breaks": [{{"id": 7, "time_windows": [[350, 500]], "service": 100}}]
                }}],
                "jobs": [
                    {{"id": 1, "location_index": 1, "service": 60}},
                    {{"id": 2, "location_index": 2, "service": 60}}
                ],
                "matrix": {}
            }}"#,
            test_utils::corridor_matrix(3, 300)
        ));
        let mut route = Route::empty(&problem, VehicleIdx::new(0));
        route.insert(&problem, 0, JobIdx::new(0));
        route.insert(&problem, 1, JobIdx::new(1));

        assert!(route.is_time_feasible());
        assert!(route.missing_breaks().is_empty());
        assert_eq!(route.steps().len(), 3);
        assert_eq!(route.len(), 2);

        // The break takes no travel; the job sequence still drives all legs.
        assert_eq!(route.travel_eval().duration, 600 * DURATION_FACTOR);
    }
}
