use fxhash::FxHashMap;
use serde::Serialize;

use crate::{
    define_index_newtype,
    problem::{
        amount::Amount,
        location::LocationIdx,
        scale::{Duration, Id, Priority},
        skill::SkillSet,
        time_window::TimeWindows,
    },
};

define_index_newtype!(JobIdx, Job);
define_index_newtype!(ShipmentIdx, ShipmentPair);

/// A regular one-stop task, or one side of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Single,
    Pickup,
    Delivery,
}

#[derive(Debug, Clone)]
pub struct Job {
    id: Id,
    job_type: JobType,
    location: LocationIdx,
    setup: Duration,
    service: Duration,
    service_per_vehicle_type: FxHashMap<String, Duration>,
    delivery: Amount,
    pickup: Amount,
    skills: SkillSet,
    priority: Priority,
    tws: TimeWindows,
    description: String,
    /// Back-reference set during model freeze for pickup/delivery pairs.
    shipment: Option<ShipmentIdx>,
}

/// Pickup and delivery indices of one shipment; pickup always precedes
/// delivery in any route containing either.
#[derive(Debug, Clone, Copy)]
pub struct ShipmentPair {
    pub pickup: JobIdx,
    pub delivery: JobIdx,
}

impl Job {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Id,
        job_type: JobType,
        location: LocationIdx,
        setup: Duration,
        service: Duration,
        service_per_vehicle_type: FxHashMap<String, Duration>,
        delivery: Amount,
        pickup: Amount,
        skills: SkillSet,
        priority: Priority,
        tws: TimeWindows,
        description: String,
    ) -> Self {
        Job {
            id,
            job_type,
            location,
            setup,
            service,
            service_per_vehicle_type,
            delivery,
            pickup,
            skills,
            priority,
            tws,
            description,
            shipment: None,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn location(&self) -> LocationIdx {
        self.location
    }

    pub fn setup(&self) -> Duration {
        self.setup
    }

    /// Service duration as seen by `vehicle_type`, falling back to the base
    /// service when no override matches.
    pub fn service_for(&self, vehicle_type: Option<&str>) -> Duration {
        vehicle_type
            .and_then(|t| self.service_per_vehicle_type.get(t))
            .copied()
            .unwrap_or(self.service)
    }

    pub fn service(&self) -> Duration {
        self.service
    }

    pub fn delivery(&self) -> &Amount {
        &self.delivery
    }

    pub fn pickup(&self) -> &Amount {
        &self.pickup
    }

    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn tws(&self) -> &TimeWindows {
        &self.tws
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn shipment(&self) -> Option<ShipmentIdx> {
        self.shipment
    }

    pub(super) fn set_shipment(&mut self, shipment: ShipmentIdx) {
        self.shipment = Some(shipment);
    }

    pub fn is_pickup(&self) -> bool {
        self.job_type == JobType::Pickup
    }

    pub fn is_delivery(&self) -> bool {
        self.job_type == JobType::Delivery
    }

    /// Total demand magnitude, the tie-break key for amount-ordered passes.
    pub fn amount_key(&self) -> Amount {
        &self.pickup + &self.delivery
    }
}

#[derive(Default)]
pub struct JobBuilder {
    id: Option<Id>,
    job_type: JobType,
    location: Option<LocationIdx>,
    setup: Duration,
    service: Duration,
    service_per_vehicle_type: FxHashMap<String, Duration>,
    delivery: Amount,
    pickup: Amount,
    skills: SkillSet,
    priority: Priority,
    tws: Option<TimeWindows>,
    description: String,
}

impl Default for JobType {
    fn default() -> Self {
        JobType::Single
    }
}

impl JobBuilder {
    pub fn set_id(&mut self, id: Id) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn set_job_type(&mut self, job_type: JobType) -> &mut Self {
        self.job_type = job_type;
        self
    }

    pub fn set_location(&mut self, location: LocationIdx) -> &mut Self {
        self.location = Some(location);
        self
    }

    pub fn set_setup(&mut self, setup: Duration) -> &mut Self {
        self.setup = setup;
        self
    }

    pub fn set_service(&mut self, service: Duration) -> &mut Self {
        self.service = service;
        self
    }

    pub fn set_service_per_vehicle_type(
        &mut self,
        overrides: FxHashMap<String, Duration>,
    ) -> &mut Self {
        self.service_per_vehicle_type = overrides;
        self
    }

    pub fn set_delivery(&mut self, delivery: Amount) -> &mut Self {
        self.delivery = delivery;
        self
    }

    pub fn set_pickup(&mut self, pickup: Amount) -> &mut Self {
        self.pickup = pickup;
        self
    }

    pub fn set_skills(&mut self, skills: SkillSet) -> &mut Self {
        self.skills = skills;
        self
    }

    pub fn set_priority(&mut self, priority: Priority) -> &mut Self {
        self.priority = priority;
        self
    }

    pub fn set_tws(&mut self, tws: TimeWindows) -> &mut Self {
        self.tws = Some(tws);
        self
    }

    pub fn set_description(&mut self, description: String) -> &mut Self {
        self.description = description;
        self
    }

    pub fn build(self) -> Job {
        Job::new(
            self.id.expect("job id is required"),
            self.job_type,
            self.location.expect("job location is required"),
            self.setup,
            self.service,
            self.service_per_vehicle_type,
            self.delivery,
            self.pickup,
            self.skills,
            self.priority,
            self.tws.unwrap_or_else(TimeWindows::full_horizon),
            self.description,
        )
    }
}
