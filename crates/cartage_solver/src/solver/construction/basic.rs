use crate::problem::{
    scale::{Cost, Id, Priority},
    vehicle_routing_problem::VehicleRoutingProblem,
};

use crate::solver::{
    deadline::Deadline,
    insertion::{for_each_insertion, Insertion},
    solution::solution_state::SolutionState,
};

/// Greedy insertion: repeatedly commits the cheapest feasible placement over
/// all (job, route, rank) triples, breaking ties by priority then job id,
/// until nothing fits.
pub fn run(problem: &VehicleRoutingProblem, solution: &mut SolutionState, deadline: &Deadline) {
    loop {
        if deadline.expired() {
            return;
        }

        let mut best: Option<(InsertionKey, Insertion)> = None;
        for job_idx in solution.unassigned_sorted() {
            if deadline.expired() {
                return;
            }
            let job = problem.job(job_idx);
            let key_tail = (std::cmp::Reverse(job.priority()), job.id());
            for_each_insertion(problem, solution, job_idx, |delta, insertion| {
                let key = (delta.cost, key_tail.0, key_tail.1);
                if best.is_none() || key < best.as_ref().unwrap().0 {
                    best = Some((key, insertion));
                }
            });
        }

        match best {
            Some((_, insertion)) => insertion.commit(solution),
            None => return,
        }
    }
}

type InsertionKey = (Cost, std::cmp::Reverse<Priority>, Id);
