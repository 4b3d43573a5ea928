pub mod route;
pub mod route_id;
pub mod solution_state;
