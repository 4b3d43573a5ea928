use crate::define_index_newtype;

use super::route::Route;

define_index_newtype!(RouteIdx, Route);

impl RouteIdx {
    pub fn as_vehicle(&self) -> crate::problem::vehicle::VehicleIdx {
        crate::problem::vehicle::VehicleIdx::new(self.get())
    }
}
