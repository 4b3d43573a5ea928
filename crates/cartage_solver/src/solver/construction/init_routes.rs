use tracing::debug;

use crate::problem::{
    breaks::BreakIdx,
    job::{JobIdx, JobType},
    scale::scale_from_user_duration,
    vehicle::{VehicleIdx, VehicleStepKind},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::solution::{route_id::RouteIdx, solution_state::SolutionState};

/// Installs user-forced routes verbatim. Steps carrying a service constraint
/// pin their job in place for the rest of the search; a `service_at` that
/// falls outside the task's own windows drops the task (it stays unassigned
/// and is reported with a reason). Forced layouts that admit no feasible
/// schedule are kept as the least-violating route rather than rejected.
pub fn apply_forced_routes(problem: &VehicleRoutingProblem, solution: &mut SolutionState) {
    for vehicle_rank in 0..problem.vehicles().len() {
        let vehicle_idx = VehicleIdx::new(vehicle_rank);
        if !problem.vehicle(vehicle_idx).has_forced_steps() {
            continue;
        }

        let mut jobs: Vec<JobIdx> = Vec::new();
        let mut break_gaps: Vec<(BreakIdx, usize)> = Vec::new();
        let mut pinned: Vec<JobIdx> = Vec::new();

        for step in problem.vehicle(vehicle_idx).steps() {
            match step.kind {
                VehicleStepKind::Start | VehicleStepKind::End => {}
                VehicleStepKind::Break => {
                    let Some(id) = step.id else { continue };
                    let found = problem
                        .vehicle(vehicle_idx)
                        .breaks()
                        .iter()
                        .find(|&&b| problem.break_at(b).id() == id)
                        .copied();
                    match found {
                        Some(b) => break_gaps.push((b, jobs.len())),
                        None => debug!(vehicle = vehicle_rank, id, "forced break not found"),
                    }
                }
                VehicleStepKind::Job | VehicleStepKind::Pickup | VehicleStepKind::Delivery => {
                    let Some(id) = step.id else { continue };
                    let kind = match step.kind {
                        VehicleStepKind::Job => JobType::Single,
                        VehicleStepKind::Pickup => JobType::Pickup,
                        _ => JobType::Delivery,
                    };
                    let Some(job_idx) = problem.job_by_id(kind, id) else {
                        debug!(vehicle = vehicle_rank, id, "forced job not found");
                        continue;
                    };
                    if !solution.is_unassigned(job_idx) {
                        continue;
                    }

                    // A forced service time outside the task's own windows is
                    // unservable; the task stays out.
                    if let Some(at) = step.forced_service.at {
                        let at = scale_from_user_duration(at);
                        if !problem.job(job_idx).tws().is_satisfied(at) {
                            debug!(
                                vehicle = vehicle_rank,
                                id, "forced service time outside task windows"
                            );
                            continue;
                        }
                    }

                    jobs.push(job_idx);
                    if step.forced_service.is_constrained() {
                        pinned.push(job_idx);
                    }
                }
            }
        }

        // Both halves of a shipment must survive, pickup first; otherwise the
        // surviving half is dropped with its partner.
        let mut kept: Vec<JobIdx> = Vec::with_capacity(jobs.len());
        for &job_idx in &jobs {
            match problem.matching_partner(job_idx) {
                None => kept.push(job_idx),
                Some(partner) => {
                    let job = problem.job(job_idx);
                    if job.is_pickup() {
                        if jobs.iter().position(|&j| j == partner)
                            > jobs.iter().position(|&j| j == job_idx)
                        {
                            kept.push(job_idx);
                        }
                    } else if kept.contains(&partner) {
                        kept.push(job_idx);
                    }
                }
            }
        }
        if kept.len() != jobs.len() {
            debug!(
                vehicle = vehicle_rank,
                dropped = jobs.len() - kept.len(),
                "forced steps broke shipment pairing"
            );
            pinned.retain(|job| kept.contains(job));
        }

        for (_, gap) in break_gaps.iter_mut() {
            *gap = (*gap).min(kept.len());
        }

        solution.force_route_layout(RouteIdx::new(vehicle_rank), kept, break_gaps, &pinned);
    }
}
