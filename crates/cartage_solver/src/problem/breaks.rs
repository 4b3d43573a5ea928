use crate::{
    define_index_newtype,
    problem::{
        amount::Amount,
        scale::{Duration, Id},
        time_window::TimeWindows,
    },
    problem::vehicle::VehicleIdx,
};

define_index_newtype!(BreakIdx, Break);

/// A vehicle-local rest step. It has no location: the vehicle pauses wherever
/// it currently is, so breaks never contribute travel cost.
#[derive(Debug, Clone)]
pub struct Break {
    id: Id,
    vehicle: VehicleIdx,
    tws: TimeWindows,
    service: Duration,
    description: String,
    /// Optional cap on the load carried while the break is taken.
    max_load: Option<Amount>,
}

impl Break {
    pub fn new(
        id: Id,
        vehicle: VehicleIdx,
        tws: TimeWindows,
        service: Duration,
        description: String,
        max_load: Option<Amount>,
    ) -> Self {
        Break {
            id,
            vehicle,
            tws,
            service,
            description,
            max_load,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn vehicle(&self) -> VehicleIdx {
        self.vehicle
    }

    pub fn tws(&self) -> &TimeWindows {
        &self.tws
    }

    pub fn service(&self) -> Duration {
        self.service
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn max_load(&self) -> Option<&Amount> {
        self.max_load.as_ref()
    }

    pub fn load_is_admissible(&self, load: &Amount) -> bool {
        match &self.max_load {
            Some(max_load) => load.fits_in(max_load),
            None => true,
        }
    }
}
