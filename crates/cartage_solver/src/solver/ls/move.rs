use crate::problem::{scale::Eval, vehicle_routing_problem::VehicleRoutingProblem};

use crate::solver::solution::{route_id::RouteIdx, solution_state::SolutionState};

use super::{
    cross_exchange::CrossExchangeOperator, intra_cross_exchange::IntraCrossExchangeOperator,
    intra_exchange::IntraExchangeOperator, intra_mixed_exchange::IntraMixedExchangeOperator,
    intra_or_opt::IntraOrOptOperator, intra_relocate::IntraRelocateOperator,
    intra_two_opt::IntraTwoOptOperator, mixed_exchange::MixedExchangeOperator,
    or_opt::OrOptOperator, pd_shift::PDShiftOperator, priority_replace::PriorityReplaceOperator,
    relocate::RelocateOperator, reverse_two_opt::ReverseTwoOptOperator,
    route_exchange::RouteExchangeOperator, route_split::RouteSplitOperator,
    swap_star::SwapStarOperator, tsp_fix::TspFixOperator, two_opt::TwoOptOperator,
    unassigned_exchange::UnassignedExchangeOperator,
};

/// The uniform operator contract: a deterministic move search over one route
/// pair, a revalidation check against possibly changed state, a committing
/// apply that leaves every route invariant intact, and the list of routes
/// other operators must re-scan afterwards.
pub trait LocalSearchOperator: Sized {
    /// Stable identifier used in search logs.
    const NAME: &'static str;

    fn generate_moves<C>(
        problem: &VehicleRoutingProblem,
        solution: &SolutionState,
        pair: (RouteIdx, RouteIdx),
        consumer: C,
    ) where
        C: FnMut(Self);

    /// Signed cost delta of this move; negative means improving. Applying
    /// the move changes the total solution cost by exactly this amount.
    fn delta(&self) -> Eval;

    fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool;

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState);

    fn updated_routes(&self) -> Vec<RouteIdx>;
}

/// Closed set of move kinds, dispatched without virtual calls so the descent
/// loop stays branch-predictable.
#[derive(Debug, Clone)]
pub enum Move {
    UnassignedExchange(UnassignedExchangeOperator),
    CrossExchange(CrossExchangeOperator),
    MixedExchange(MixedExchangeOperator),
    TwoOpt(TwoOptOperator),
    ReverseTwoOpt(ReverseTwoOptOperator),
    Relocate(RelocateOperator),
    OrOpt(OrOptOperator),
    IntraExchange(IntraExchangeOperator),
    IntraCrossExchange(IntraCrossExchangeOperator),
    IntraMixedExchange(IntraMixedExchangeOperator),
    IntraRelocate(IntraRelocateOperator),
    IntraOrOpt(IntraOrOptOperator),
    IntraTwoOpt(IntraTwoOptOperator),
    PDShift(PDShiftOperator),
    RouteExchange(RouteExchangeOperator),
    SwapStar(SwapStarOperator),
    RouteSplit(RouteSplitOperator),
    PriorityReplace(PriorityReplaceOperator),
    TspFix(TspFixOperator),
}

macro_rules! dispatch {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            Move::UnassignedExchange($op) => $body,
            Move::CrossExchange($op) => $body,
            Move::MixedExchange($op) => $body,
            Move::TwoOpt($op) => $body,
            Move::ReverseTwoOpt($op) => $body,
            Move::Relocate($op) => $body,
            Move::OrOpt($op) => $body,
            Move::IntraExchange($op) => $body,
            Move::IntraCrossExchange($op) => $body,
            Move::IntraMixedExchange($op) => $body,
            Move::IntraRelocate($op) => $body,
            Move::IntraOrOpt($op) => $body,
            Move::IntraTwoOpt($op) => $body,
            Move::PDShift($op) => $body,
            Move::RouteExchange($op) => $body,
            Move::SwapStar($op) => $body,
            Move::RouteSplit($op) => $body,
            Move::PriorityReplace($op) => $body,
            Move::TspFix($op) => $body,
        }
    };
}

impl Move {
    pub fn operator_name(&self) -> &'static str {
        match self {
            Move::UnassignedExchange(_) => UnassignedExchangeOperator::NAME,
            Move::CrossExchange(_) => CrossExchangeOperator::NAME,
            Move::MixedExchange(_) => MixedExchangeOperator::NAME,
            Move::TwoOpt(_) => TwoOptOperator::NAME,
            Move::ReverseTwoOpt(_) => ReverseTwoOptOperator::NAME,
            Move::Relocate(_) => RelocateOperator::NAME,
            Move::OrOpt(_) => OrOptOperator::NAME,
            Move::IntraExchange(_) => IntraExchangeOperator::NAME,
            Move::IntraCrossExchange(_) => IntraCrossExchangeOperator::NAME,
            Move::IntraMixedExchange(_) => IntraMixedExchangeOperator::NAME,
            Move::IntraRelocate(_) => IntraRelocateOperator::NAME,
            Move::IntraOrOpt(_) => IntraOrOptOperator::NAME,
            Move::IntraTwoOpt(_) => IntraTwoOptOperator::NAME,
            Move::PDShift(_) => PDShiftOperator::NAME,
            Move::RouteExchange(_) => RouteExchangeOperator::NAME,
            Move::SwapStar(_) => SwapStarOperator::NAME,
            Move::RouteSplit(_) => RouteSplitOperator::NAME,
            Move::PriorityReplace(_) => PriorityReplaceOperator::NAME,
            Move::TspFix(_) => TspFixOperator::NAME,
        }
    }

    pub fn delta(&self) -> Eval {
        dispatch!(self, op => op.delta())
    }

    pub fn is_valid(&self, problem: &VehicleRoutingProblem, solution: &SolutionState) -> bool {
        dispatch!(self, op => op.is_valid(problem, solution))
    }

    pub fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
        dispatch!(self, op => op.apply(problem, solution))
    }

    pub fn updated_routes(&self) -> Vec<RouteIdx> {
        dispatch!(self, op => op.updated_routes())
    }
}
