pub mod input;
pub mod output;

pub use input::{parse_problem, VehicleRoutingProblemInput};
pub use output::{solution_document, SolutionDocument};
