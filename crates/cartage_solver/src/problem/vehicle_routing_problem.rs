use fxhash::FxHashMap;

use crate::problem::{
    breaks::{Break, BreakIdx},
    job::{Job, JobIdx, JobType, ShipmentIdx, ShipmentPair},
    location::{Location, LocationIdx},
    matrix::{ProfileIdx, ProfileMatrices, TravelView},
    scale::Id,
    vehicle::{Vehicle, VehicleIdx},
};

/// Immutable, index-addressed description of one solve request: the fleet,
/// the tasks, the shipment pairing and the per-profile matrices. Built once,
/// then shared read-only across search workers.
#[derive(Debug)]
pub struct VehicleRoutingProblem {
    vehicles: Vec<Vehicle>,
    jobs: Vec<Job>,
    breaks: Vec<Break>,
    shipments: Vec<ShipmentPair>,
    locations: Vec<Location>,
    profiles: Vec<ProfileMatrices>,
    amount_dimensions: usize,
    has_time_windows: bool,
    /// Task lookup keyed by (kind, id); jobs, pickups and deliveries use
    /// separate id spaces.
    jobs_by_id: FxHashMap<(JobType, Id), JobIdx>,
}

impl VehicleRoutingProblem {
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, idx: VehicleIdx) -> &Vehicle {
        &self.vehicles[idx]
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, idx: JobIdx) -> &Job {
        &self.jobs[idx]
    }

    pub fn job_by_id(&self, job_type: JobType, id: Id) -> Option<JobIdx> {
        self.jobs_by_id.get(&(job_type, id)).copied()
    }

    pub fn breaks(&self) -> &[Break] {
        &self.breaks
    }

    pub fn break_at(&self, idx: BreakIdx) -> &Break {
        &self.breaks[idx]
    }

    pub fn shipments(&self) -> &[ShipmentPair] {
        &self.shipments
    }

    pub fn shipment(&self, idx: ShipmentIdx) -> &ShipmentPair {
        &self.shipments[idx]
    }

    /// The other half of a shipment, if `job` belongs to one.
    pub fn matching_partner(&self, job: JobIdx) -> Option<JobIdx> {
        self.jobs[job].shipment().map(|s| {
            let pair = &self.shipments[s];
            if pair.pickup == job {
                pair.delivery
            } else {
                pair.pickup
            }
        })
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, idx: LocationIdx) -> &Location {
        &self.locations[idx]
    }

    pub fn profiles(&self) -> &[ProfileMatrices] {
        &self.profiles
    }

    pub fn profile(&self, idx: ProfileIdx) -> &ProfileMatrices {
        &self.profiles[idx]
    }

    pub fn amount_dimensions(&self) -> usize {
        self.amount_dimensions
    }

    pub fn has_time_windows(&self) -> bool {
        self.has_time_windows
    }

    /// Travel oracle for one vehicle: its profile's matrices through its
    /// speed factor and cost rates.
    pub fn travel(&self, vehicle: VehicleIdx) -> TravelView<'_> {
        let v = &self.vehicles[vehicle];
        TravelView::new(&self.profiles[v.profile()], *v.costs(), v.speed_factor())
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    vehicles: Vec<Vehicle>,
    jobs: Vec<Job>,
    breaks: Vec<Break>,
    shipments: Vec<ShipmentPair>,
    locations: Vec<Location>,
    profiles: Vec<ProfileMatrices>,
    amount_dimensions: usize,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_amount_dimensions(&mut self, dimensions: usize) -> &mut Self {
        self.amount_dimensions = dimensions;
        self
    }

    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut Self {
        self.locations = locations;
        self
    }

    pub fn set_profiles(&mut self, profiles: Vec<ProfileMatrices>) -> &mut Self {
        self.profiles = profiles;
        self
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> VehicleIdx {
        let idx = VehicleIdx::new(self.vehicles.len());
        self.vehicles.push(vehicle);
        idx
    }

    pub fn add_break(&mut self, b: Break) -> BreakIdx {
        let idx = BreakIdx::new(self.breaks.len());
        self.breaks.push(b);
        idx
    }

    pub fn add_job(&mut self, job: Job) -> JobIdx {
        let idx = JobIdx::new(self.jobs.len());
        self.jobs.push(job);
        idx
    }

    /// Registers a pickup/delivery pair and wires the back-references.
    pub fn add_shipment(&mut self, pickup: Job, delivery: Job) -> ShipmentIdx {
        debug_assert_eq!(pickup.job_type(), JobType::Pickup);
        debug_assert_eq!(delivery.job_type(), JobType::Delivery);

        let shipment = ShipmentIdx::new(self.shipments.len());
        let pickup_idx = self.add_job(pickup);
        let delivery_idx = self.add_job(delivery);
        self.jobs[pickup_idx].set_shipment(shipment);
        self.jobs[delivery_idx].set_shipment(shipment);
        self.shipments.push(ShipmentPair {
            pickup: pickup_idx,
            delivery: delivery_idx,
        });
        shipment
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn build(self) -> VehicleRoutingProblem {
        let has_time_windows = self
            .jobs
            .iter()
            .any(|job| job.tws().iter().any(|tw| !tw.is_default()))
            || self
                .vehicles
                .iter()
                .any(|vehicle| !vehicle.tw().is_default())
            || !self.breaks.is_empty();

        let jobs_by_id = self
            .jobs
            .iter()
            .enumerate()
            .map(|(idx, job)| ((job.job_type(), job.id()), JobIdx::new(idx)))
            .collect();

        VehicleRoutingProblem {
            vehicles: self.vehicles,
            jobs: self.jobs,
            breaks: self.breaks,
            shipments: self.shipments,
            locations: self.locations,
            profiles: self.profiles,
            amount_dimensions: self.amount_dimensions,
            has_time_windows,
            jobs_by_id,
        }
    }
}
