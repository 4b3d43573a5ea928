use crate::{
    define_index_newtype,
    problem::{
        amount::Amount,
        breaks::BreakIdx,
        job::Job,
        location::LocationIdx,
        matrix::ProfileIdx,
        scale::{
            scale_from_user_cost, Cost, Distance, Duration, Id, UserCost, UserDuration,
            DEFAULT_COST_PER_HOUR, DEFAULT_COST_PER_KM, DEFAULT_MAX_DISTANCE, DEFAULT_MAX_TASKS,
            DEFAULT_MAX_TRAVEL_TIME,
        },
        skill::SkillSet,
        time_window::TimeWindow,
    },
};

define_index_newtype!(VehicleIdx, Vehicle);

/// Fixed cost per use plus travel rates. Rates stay in user units and are
/// folded into scaled costs by the travel view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleCosts {
    pub fixed: UserCost,
    pub per_hour: UserCost,
    pub per_km: UserCost,
}

impl Default for VehicleCosts {
    fn default() -> Self {
        VehicleCosts {
            fixed: 0,
            per_hour: DEFAULT_COST_PER_HOUR,
            per_km: DEFAULT_COST_PER_KM,
        }
    }
}

impl VehicleCosts {
    pub fn scaled_fixed(&self) -> Cost {
        scale_from_user_cost(self.fixed)
    }
}

/// What a user-forced step pins down, if anything. `at` fixes the service
/// start exactly; `after`/`before` bound it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForcedService {
    pub at: Option<UserDuration>,
    pub after: Option<UserDuration>,
    pub before: Option<UserDuration>,
}

impl ForcedService {
    pub fn is_constrained(&self) -> bool {
        self.at.is_some() || self.after.is_some() || self.before.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStepKind {
    Start,
    Job,
    Pickup,
    Delivery,
    Break,
    End,
}

/// One entry of a user-provided `steps` array, fixing part or all of the
/// vehicle's sequence.
#[derive(Debug, Clone)]
pub struct VehicleStep {
    pub kind: VehicleStepKind,
    /// Task or break id; absent on terminal steps.
    pub id: Option<Id>,
    pub forced_service: ForcedService,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    id: Id,
    start: Option<LocationIdx>,
    end: Option<LocationIdx>,
    profile: ProfileIdx,
    capacity: Amount,
    skills: SkillSet,
    tw: TimeWindow,
    breaks: Vec<BreakIdx>,
    description: String,
    costs: VehicleCosts,
    speed_factor: f64,
    service_type: Option<String>,
    max_tasks: usize,
    max_travel_time: Duration,
    max_distance: Distance,
    steps: Vec<VehicleStep>,
}

impl Vehicle {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn start(&self) -> Option<LocationIdx> {
        self.start
    }

    pub fn end(&self) -> Option<LocationIdx> {
        self.end
    }

    pub fn profile(&self) -> ProfileIdx {
        self.profile
    }

    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }

    pub fn tw(&self) -> &TimeWindow {
        &self.tw
    }

    pub fn breaks(&self) -> &[BreakIdx] {
        &self.breaks
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn costs(&self) -> &VehicleCosts {
        &self.costs
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn service_type(&self) -> Option<&str> {
        self.service_type.as_deref()
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn max_travel_time(&self) -> Duration {
        self.max_travel_time
    }

    pub fn max_distance(&self) -> Distance {
        self.max_distance
    }

    pub fn steps(&self) -> &[VehicleStep] {
        &self.steps
    }

    pub fn has_forced_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Skill compatibility: the job's requirements must be a subset of what
    /// the vehicle provides.
    pub fn can_serve(&self, job: &Job) -> bool {
        job.skills().is_subset(&self.skills)
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    id: Option<Id>,
    start: Option<LocationIdx>,
    end: Option<LocationIdx>,
    profile: Option<ProfileIdx>,
    capacity: Amount,
    skills: SkillSet,
    tw: Option<TimeWindow>,
    breaks: Vec<BreakIdx>,
    description: String,
    costs: Option<VehicleCosts>,
    speed_factor: Option<f64>,
    service_type: Option<String>,
    max_tasks: Option<usize>,
    max_travel_time: Option<Duration>,
    max_distance: Option<Distance>,
    steps: Vec<VehicleStep>,
}

impl VehicleBuilder {
    pub fn set_id(&mut self, id: Id) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn set_start(&mut self, start: LocationIdx) -> &mut Self {
        self.start = Some(start);
        self
    }

    pub fn set_end(&mut self, end: LocationIdx) -> &mut Self {
        self.end = Some(end);
        self
    }

    pub fn set_profile(&mut self, profile: ProfileIdx) -> &mut Self {
        self.profile = Some(profile);
        self
    }

    pub fn set_capacity(&mut self, capacity: Amount) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn set_skills(&mut self, skills: SkillSet) -> &mut Self {
        self.skills = skills;
        self
    }

    pub fn set_tw(&mut self, tw: TimeWindow) -> &mut Self {
        self.tw = Some(tw);
        self
    }

    pub fn set_breaks(&mut self, breaks: Vec<BreakIdx>) -> &mut Self {
        self.breaks = breaks;
        self
    }

    pub fn set_description(&mut self, description: String) -> &mut Self {
        self.description = description;
        self
    }

    pub fn set_costs(&mut self, costs: VehicleCosts) -> &mut Self {
        self.costs = Some(costs);
        self
    }

    pub fn set_speed_factor(&mut self, speed_factor: f64) -> &mut Self {
        self.speed_factor = Some(speed_factor);
        self
    }

    pub fn set_service_type(&mut self, service_type: String) -> &mut Self {
        self.service_type = Some(service_type);
        self
    }

    pub fn set_max_tasks(&mut self, max_tasks: usize) -> &mut Self {
        self.max_tasks = Some(max_tasks);
        self
    }

    pub fn set_max_travel_time(&mut self, max_travel_time: Duration) -> &mut Self {
        self.max_travel_time = Some(max_travel_time);
        self
    }

    pub fn set_max_distance(&mut self, max_distance: Distance) -> &mut Self {
        self.max_distance = Some(max_distance);
        self
    }

    pub fn set_steps(&mut self, steps: Vec<VehicleStep>) -> &mut Self {
        self.steps = steps;
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            id: self.id.expect("vehicle id is required"),
            start: self.start,
            end: self.end,
            profile: self.profile.unwrap_or_default(),
            capacity: self.capacity,
            skills: self.skills,
            tw: self.tw.unwrap_or(TimeWindow::FULL_HORIZON),
            breaks: self.breaks,
            description: self.description,
            costs: self.costs.unwrap_or_default(),
            speed_factor: self.speed_factor.unwrap_or(1.0),
            service_type: self.service_type,
            max_tasks: self.max_tasks.unwrap_or(DEFAULT_MAX_TASKS),
            max_travel_time: self.max_travel_time.unwrap_or(DEFAULT_MAX_TRAVEL_TIME),
            max_distance: self.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE),
            steps: self.steps,
        }
    }
}
