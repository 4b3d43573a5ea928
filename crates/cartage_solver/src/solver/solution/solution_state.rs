use std::sync::Arc;

use fxhash::FxHashSet;

use crate::problem::{
    job::JobIdx,
    scale::Cost,
    vehicle::VehicleIdx,
    vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{route::Route, route_id::RouteIdx};

/// One worker's view of a solution in progress: a route per vehicle plus the
/// complement set of unassigned jobs. Routes are indexed by vehicle, so the
/// assignment map is the per-route rank table.
#[derive(Clone)]
pub struct SolutionState {
    problem: Arc<VehicleRoutingProblem>,
    routes: Vec<Route>,
    unassigned: FxHashSet<JobIdx>,
    /// Jobs pinned by user-forced steps; operators never move them.
    fixed: FxHashSet<JobIdx>,
}

impl SolutionState {
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        let routes = (0..problem.vehicles().len())
            .map(|v| Route::empty(&problem, VehicleIdx::new(v)))
            .collect();
        let unassigned = (0..problem.jobs().len()).map(JobIdx::new).collect();

        SolutionState {
            problem,
            routes,
            unassigned,
            fixed: FxHashSet::default(),
        }
    }

    pub fn is_fixed(&self, job: JobIdx) -> bool {
        self.fixed.contains(&job)
    }

    /// True when the job segment `[start, end)` of `route` holds no pinned
    /// job and may be rearranged freely.
    pub fn segment_is_movable(&self, route: RouteIdx, start: usize, end: usize) -> bool {
        if self.fixed.is_empty() {
            return true;
        }
        self.routes[route].jobs()[start..end]
            .iter()
            .all(|job| !self.fixed.contains(job))
    }

    pub fn problem(&self) -> &Arc<VehicleRoutingProblem> {
        &self.problem
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, idx: RouteIdx) -> &Route {
        &self.routes[idx]
    }

    pub fn route_mut(&mut self, idx: RouteIdx) -> &mut Route {
        &mut self.routes[idx]
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn unassigned(&self) -> &FxHashSet<JobIdx> {
        &self.unassigned
    }

    pub fn is_unassigned(&self, job: JobIdx) -> bool {
        self.unassigned.contains(&job)
    }

    /// Unassigned jobs in deterministic id order.
    pub fn unassigned_sorted(&self) -> Vec<JobIdx> {
        let mut jobs: Vec<JobIdx> = self.unassigned.iter().copied().collect();
        jobs.sort();
        jobs
    }

    pub fn insert_job(&mut self, route: RouteIdx, rank: usize, job: JobIdx) {
        debug_assert!(self.unassigned.contains(&job));
        let problem = Arc::clone(&self.problem);
        self.routes[route].insert(&problem, rank, job);
        self.unassigned.remove(&job);
    }

    pub fn insert_pair(
        &mut self,
        route: RouteIdx,
        pickup_rank: usize,
        pickup: JobIdx,
        delivery_rank: usize,
        delivery: JobIdx,
    ) {
        debug_assert!(self.unassigned.contains(&pickup));
        debug_assert!(self.unassigned.contains(&delivery));
        let problem = Arc::clone(&self.problem);
        self.routes[route].insert_pair(&problem, pickup_rank, pickup, delivery_rank, delivery);
        self.unassigned.remove(&pickup);
        self.unassigned.remove(&delivery);
    }

    /// Bookkeeping for operators that rearrange routes directly.
    pub(crate) fn mark_assigned(&mut self, job: JobIdx) {
        self.unassigned.remove(&job);
    }

    pub(crate) fn mark_unassigned(&mut self, job: JobIdx) {
        self.unassigned.insert(job);
    }

    /// Installs a forced route layout, claiming its jobs from the unassigned
    /// pool and pinning the constrained ones.
    pub fn force_route_layout(
        &mut self,
        route: RouteIdx,
        jobs: Vec<crate::problem::job::JobIdx>,
        break_gaps: Vec<(crate::problem::breaks::BreakIdx, usize)>,
        pinned: &[crate::problem::job::JobIdx],
    ) {
        for job in &jobs {
            self.unassigned.remove(job);
        }
        for &job in pinned {
            self.fixed.insert(job);
        }
        let problem = Arc::clone(&self.problem);
        self.routes[route].force_layout(&problem, jobs, break_gaps);
    }

    pub fn total_cost(&self) -> Cost {
        self.routes
            .iter()
            .map(|route| route.cost(&self.problem))
            .sum()
    }

    pub fn assigned_count(&self) -> usize {
        self.problem.jobs().len() - self.unassigned.len()
    }
}
