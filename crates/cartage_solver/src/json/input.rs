//! Input document per the public JSON contract: `jobs` and/or `shipments`,
//! `vehicles`, per-profile `matrices` (or the deprecated top-level `matrix`).
//! Deserialization is plain serde; every cross-reference and range rule is
//! enforced here before the frozen problem model is built.

use std::collections::BTreeMap;

use fxhash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use crate::error::SolverError;
use crate::problem::{
    amount::Amount,
    breaks::Break,
    job::{Job, JobBuilder, JobType},
    location::{Location, LocationIdx},
    matrix::{Matrix, ProfileIdx, ProfileMatrices},
    scale::{
        scale_from_user_duration, Duration, Id, UserCost, UserDistance, UserDuration,
        MAX_PRIORITY, MAX_SPEED_FACTOR,
    },
    skill::skill_set,
    time_window::{TimeWindow, TimeWindows},
    vehicle::{
        ForcedService, VehicleBuilder, VehicleCosts, VehicleStep, VehicleStepKind,
    },
    vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
};

pub const DEFAULT_PROFILE: &str = "car";

#[derive(Deserialize)]
pub struct VehicleRoutingProblemInput {
    #[serde(default)]
    pub jobs: Vec<JobInput>,
    #[serde(default)]
    pub shipments: Vec<ShipmentInput>,
    #[serde(default)]
    pub vehicles: Vec<VehicleInput>,
    #[serde(default)]
    pub matrices: BTreeMap<String, MatrixInput>,
    /// Deprecated: interpreted as `matrices.car.durations`.
    pub matrix: Option<Vec<Vec<UserDuration>>>,
}

#[derive(Deserialize, Default)]
pub struct MatrixInput {
    pub durations: Option<Vec<Vec<UserDuration>>>,
    pub distances: Option<Vec<Vec<UserDistance>>>,
    pub costs: Option<Vec<Vec<UserCost>>>,
}

#[derive(Deserialize)]
pub struct VehicleInput {
    pub id: Id,
    pub start: Option<[f64; 2]>,
    pub end: Option<[f64; 2]>,
    pub start_index: Option<usize>,
    pub end_index: Option<usize>,
    pub profile: Option<String>,
    pub capacity: Option<Vec<i64>>,
    #[serde(default)]
    pub skills: Vec<u32>,
    pub time_window: Option<[UserDuration; 2]>,
    pub time_windows: Option<Vec<[UserDuration; 2]>>,
    #[serde(default)]
    pub breaks: Vec<BreakInput>,
    #[serde(default)]
    pub description: String,
    pub costs: Option<VehicleCostsInput>,
    pub speed_factor: Option<f64>,
    pub service_type: Option<String>,
    pub max_tasks: Option<usize>,
    pub max_travel_time: Option<UserDuration>,
    pub max_distance: Option<UserDistance>,
    #[serde(default)]
    pub steps: Vec<VehicleStepInput>,
}

#[derive(Deserialize)]
pub struct VehicleCostsInput {
    #[serde(default)]
    pub fixed: UserCost,
    pub per_hour: Option<UserCost>,
    pub per_km: Option<UserCost>,
}

#[derive(Deserialize)]
pub struct BreakInput {
    pub id: Id,
    pub time_windows: Option<Vec<[UserDuration; 2]>>,
    #[serde(default)]
    pub service: UserDuration,
    #[serde(default)]
    pub description: String,
    pub max_load: Option<Vec<i64>>,
}

#[derive(Deserialize)]
pub struct VehicleStepInput {
    #[serde(rename = "type")]
    pub step_type: String,
    pub id: Option<Id>,
    pub service_at: Option<UserDuration>,
    pub service_after: Option<UserDuration>,
    pub service_before: Option<UserDuration>,
}

#[derive(Deserialize)]
pub struct JobInput {
    pub id: Id,
    pub location: Option<[f64; 2]>,
    pub location_index: Option<usize>,
    #[serde(default)]
    pub setup: UserDuration,
    #[serde(default)]
    pub service: UserDuration,
    #[serde(default)]
    pub service_per_vehicle_type: BTreeMap<String, UserDuration>,
    pub delivery: Option<Vec<i64>>,
    /// Deprecated alias for `delivery`, honored when neither `delivery` nor
    /// `pickup` is present.
    pub amount: Option<Vec<i64>>,
    pub pickup: Option<Vec<i64>>,
    #[serde(default)]
    pub skills: Vec<u32>,
    #[serde(default)]
    pub priority: u32,
    pub time_windows: Option<Vec<[UserDuration; 2]>>,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct ShipmentInput {
    pub pickup: ShipmentSideInput,
    pub delivery: ShipmentSideInput,
    pub amount: Option<Vec<i64>>,
    #[serde(default)]
    pub skills: Vec<u32>,
    #[serde(default)]
    pub priority: u32,
}

#[derive(Deserialize)]
pub struct ShipmentSideInput {
    pub id: Id,
    pub location: Option<[f64; 2]>,
    pub location_index: Option<usize>,
    #[serde(default)]
    pub setup: UserDuration,
    #[serde(default)]
    pub service: UserDuration,
    #[serde(default)]
    pub service_per_vehicle_type: BTreeMap<String, UserDuration>,
    pub time_windows: Option<Vec<[UserDuration; 2]>>,
    #[serde(default)]
    pub description: String,
}

pub fn parse_problem(input: &str) -> Result<VehicleRoutingProblem, SolverError> {
    let document: VehicleRoutingProblemInput =
        serde_json::from_str(input).map_err(|e| SolverError::Input(e.to_string()))?;
    document.into_problem()
}

impl VehicleRoutingProblemInput {
    pub fn into_problem(self) -> Result<VehicleRoutingProblem, SolverError> {
        if self.jobs.is_empty() && self.shipments.is_empty() {
            return Err(SolverError::input("Invalid jobs or shipments."));
        }
        if self.vehicles.is_empty() {
            return Err(SolverError::input("Invalid vehicles."));
        }

        // The amount dimension is fixed by the first vehicle's capacity.
        let amount_size = self.vehicles[0]
            .capacity
            .as_ref()
            .map(Vec::len)
            .unwrap_or(0);

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.set_amount_dimensions(amount_size);

        let (profiles, profile_ranks) = self.build_profiles()?;
        let matrix_size = profiles
            .iter()
            .map(ProfileMatrices::size)
            .min()
            .unwrap_or(0);
        builder.set_profiles(profiles);

        let mut coordinates: FxHashMap<usize, [f64; 2]> = FxHashMap::default();

        // Vehicles; multiple time windows expand into logical vehicles
        // sharing the id.
        for vehicle in &self.vehicles {
            let windows = match (&vehicle.time_windows, vehicle.time_window) {
                (Some(windows), _) => {
                    if windows.is_empty() {
                        return Err(invalid_vehicle(vehicle.id, "time_windows"));
                    }
                    check_windows(windows, vehicle.id, "vehicle")?;
                    windows.clone()
                }
                (None, Some(window)) => vec![window],
                (None, None) => vec![[0, UserDuration::MAX]],
            };

            for window in windows {
                add_vehicle(
                    &mut builder,
                    vehicle,
                    window,
                    amount_size,
                    matrix_size,
                    &profile_ranks,
                    &mut coordinates,
                )?;
            }
        }

        // Jobs.
        let mut seen_ids: FxHashSet<(JobType, Id)> = FxHashSet::default();
        for job in &self.jobs {
            if !seen_ids.insert((JobType::Single, job.id)) {
                return Err(SolverError::Input(format!(
                    "Duplicate job id: {}.",
                    job.id
                )));
            }
            let location = task_location(
                job.location_index,
                job.location,
                matrix_size,
                &mut coordinates,
                "job",
                job.id,
            )?;

            let delivery = match (&job.delivery, &job.pickup, &job.amount) {
                (None, None, Some(amount)) => Some(amount),
                (delivery, _, _) => delivery.as_ref(),
            };
            let mut jb = JobBuilder::default();
            jb.set_id(job.id)
                .set_job_type(JobType::Single)
                .set_location(location)
                .set_setup(scale_from_user_duration(job.setup))
                .set_service(scale_from_user_duration(job.service))
                .set_service_per_vehicle_type(scale_duration_map(&job.service_per_vehicle_type))
                .set_delivery(get_amount(delivery, amount_size, "delivery", job.id)?)
                .set_pickup(get_amount(job.pickup.as_ref(), amount_size, "pickup", job.id)?)
                .set_skills(skill_set(job.skills.iter().copied()))
                .set_priority(check_priority(job.priority, job.id)?)
                .set_tws(task_windows(&job.time_windows, job.id)?)
                .set_description(job.description.clone());
            builder.add_job(jb.build());
        }

        // Shipments: a pickup/delivery pair sharing amount, skills and
        // priority.
        for shipment in &self.shipments {
            if !seen_ids.insert((JobType::Pickup, shipment.pickup.id)) {
                return Err(SolverError::Input(format!(
                    "Duplicate pickup id: {}.",
                    shipment.pickup.id
                )));
            }
            if !seen_ids.insert((JobType::Delivery, shipment.delivery.id)) {
                return Err(SolverError::Input(format!(
                    "Duplicate delivery id: {}.",
                    shipment.delivery.id
                )));
            }

            let amount = get_amount(shipment.amount.as_ref(), amount_size, "amount", shipment.pickup.id)?;
            let skills = skill_set(shipment.skills.iter().copied());
            let priority = check_priority(shipment.priority, shipment.pickup.id)?;

            let pickup = shipment_side(
                &shipment.pickup,
                JobType::Pickup,
                &amount,
                &skills,
                priority,
                matrix_size,
                &mut coordinates,
            )?;
            let delivery = shipment_side(
                &shipment.delivery,
                JobType::Delivery,
                &amount,
                &skills,
                priority,
                matrix_size,
                &mut coordinates,
            )?;
            builder.add_shipment(pickup, delivery);
        }

        let locations = (0..matrix_size)
            .map(|rank| Location::new(rank, coordinates.get(&rank).copied()))
            .collect();
        builder.set_locations(locations);

        Ok(builder.build())
    }

    /// Profiles referenced by the fleet, each with validated square matrices.
    fn build_profiles(
        &self,
    ) -> Result<(Vec<ProfileMatrices>, BTreeMap<String, ProfileIdx>), SolverError> {
        let mut names: Vec<String> = self
            .vehicles
            .iter()
            .map(|v| {
                v.profile
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROFILE.to_owned())
            })
            .collect();
        names.sort();
        names.dedup();

        let mut profiles = Vec::with_capacity(names.len());
        let mut ranks = BTreeMap::new();

        for name in names {
            let entry = self.matrices.get(&name);
            let durations = match entry.and_then(|m| m.durations.as_ref()) {
                Some(durations) => durations.clone(),
                None if name == DEFAULT_PROFILE => match &self.matrix {
                    Some(matrix) => matrix.clone(),
                    None => {
                        return Err(SolverError::Routing(format!(
                            "No durations matrix for profile {name} and no routing adapter configured."
                        )))
                    }
                },
                None => {
                    return Err(SolverError::Routing(format!(
                        "No durations matrix for profile {name} and no routing adapter configured."
                    )))
                }
            };

            let durations = check_square(durations, "durations")?;
            let size = durations.size();
            let distances = match entry.and_then(|m| m.distances.as_ref()) {
                Some(distances) => {
                    let distances = check_square(distances.clone(), "distances")?;
                    if distances.size() != size {
                        return Err(SolverError::input("Inconsistent matrix sizes."));
                    }
                    Some(distances)
                }
                None => None,
            };
            let costs = match entry.and_then(|m| m.costs.as_ref()) {
                Some(costs) => {
                    let costs = check_square(costs.clone(), "costs")?;
                    if costs.size() != size {
                        return Err(SolverError::input("Inconsistent matrix sizes."));
                    }
                    Some(costs)
                }
                None => None,
            };

            ranks.insert(name.clone(), ProfileIdx::new(profiles.len()));
            profiles.push(ProfileMatrices::new(name, durations, distances, costs));
        }

        Ok((profiles, ranks))
    }
}

#[allow(clippy::too_many_arguments)]
fn add_vehicle(
    builder: &mut VehicleRoutingProblemBuilder,
    vehicle: &VehicleInput,
    window: [UserDuration; 2],
    amount_size: usize,
    matrix_size: usize,
    profile_ranks: &BTreeMap<String, ProfileIdx>,
    coordinates: &mut FxHashMap<usize, [f64; 2]>,
) -> Result<(), SolverError> {
    if window[0] > window[1] {
        return Err(invalid_vehicle(vehicle.id, "time_window"));
    }

    let speed_factor = vehicle.speed_factor.unwrap_or(1.0);
    if !(speed_factor > 0.0 && speed_factor <= MAX_SPEED_FACTOR) {
        return Err(invalid_vehicle(vehicle.id, "speed_factor"));
    }

    let capacity = get_amount(vehicle.capacity.as_ref(), amount_size, "capacity", vehicle.id)?;

    let start = optional_rank(
        vehicle.start_index,
        vehicle.start,
        matrix_size,
        coordinates,
        "start_index",
        vehicle.id,
    )?;
    let end = optional_rank(
        vehicle.end_index,
        vehicle.end,
        matrix_size,
        coordinates,
        "end_index",
        vehicle.id,
    )?;

    let profile_name = vehicle
        .profile
        .clone()
        .unwrap_or_else(|| DEFAULT_PROFILE.to_owned());
    let profile = profile_ranks[&profile_name];

    let costs = match &vehicle.costs {
        Some(costs) => VehicleCosts {
            fixed: costs.fixed,
            per_hour: costs.per_hour.unwrap_or(VehicleCosts::default().per_hour),
            per_km: costs.per_km.unwrap_or(VehicleCosts::default().per_km),
        },
        None => VehicleCosts::default(),
    };

    // Breaks are per logical vehicle, sorted by their first window.
    let mut parsed_breaks: Vec<(TimeWindows, &BreakInput)> = vehicle
        .breaks
        .iter()
        .map(|b| Ok((task_windows(&b.time_windows, b.id)?, b)))
        .collect::<Result<_, SolverError>>()?;
    parsed_breaks.sort_by_key(|(tws, b)| (tws.first().start, tws.first().end, b.id));

    let vehicle_idx = crate::problem::vehicle::VehicleIdx::new(builder.vehicles().len());
    let mut break_indices = Vec::with_capacity(parsed_breaks.len());
    for (tws, b) in parsed_breaks {
        let max_load = match &b.max_load {
            Some(load) => Some(get_amount(Some(load), amount_size, "max_load", b.id)?),
            None => None,
        };
        break_indices.push(builder.add_break(Break::new(
            b.id,
            vehicle_idx,
            tws,
            scale_from_user_duration(b.service),
            b.description.clone(),
            max_load,
        )));
    }

    let steps = vehicle
        .steps
        .iter()
        .map(|step| parse_step(step, vehicle.id))
        .collect::<Result<Vec<_>, _>>()?;

    let mut vb = VehicleBuilder::default();
    vb.set_id(vehicle.id)
        .set_profile(profile)
        .set_capacity(capacity)
        .set_skills(skill_set(vehicle.skills.iter().copied()))
        .set_tw(TimeWindow::from_user(window[0], window[1]))
        .set_breaks(break_indices)
        .set_description(vehicle.description.clone())
        .set_costs(costs)
        .set_speed_factor(speed_factor)
        .set_steps(steps);
    if let Some(start) = start {
        vb.set_start(start);
    }
    if let Some(end) = end {
        vb.set_end(end);
    }
    if let Some(service_type) = &vehicle.service_type {
        vb.set_service_type(service_type.clone());
    }
    if let Some(max_tasks) = vehicle.max_tasks {
        vb.set_max_tasks(max_tasks);
    }
    if let Some(max_travel_time) = vehicle.max_travel_time {
        vb.set_max_travel_time(scale_from_user_duration(max_travel_time));
    }
    if let Some(max_distance) = vehicle.max_distance {
        vb.set_max_distance(max_distance as Duration);
    }

    builder.add_vehicle(vb.build());
    Ok(())
}

fn invalid_vehicle(id: Id, key: &str) -> SolverError {
    SolverError::Input(format!("Invalid {key} for vehicle {id}."))
}

fn parse_step(step: &VehicleStepInput, vehicle_id: Id) -> Result<VehicleStep, SolverError> {
    let kind = match step.step_type.as_str() {
        "start" => VehicleStepKind::Start,
        "job" => VehicleStepKind::Job,
        "pickup" => VehicleStepKind::Pickup,
        "delivery" => VehicleStepKind::Delivery,
        "break" => VehicleStepKind::Break,
        "end" => VehicleStepKind::End,
        _ => {
            return Err(SolverError::Input(format!(
                "Invalid type in steps for vehicle {vehicle_id}."
            )))
        }
    };
    if !matches!(kind, VehicleStepKind::Start | VehicleStepKind::End) && step.id.is_none() {
        return Err(SolverError::Input(format!(
            "Invalid id in steps for vehicle {vehicle_id}."
        )));
    }
    Ok(VehicleStep {
        kind,
        id: step.id,
        forced_service: ForcedService {
            at: step.service_at,
            after: step.service_after,
            before: step.service_before,
        },
    })
}

fn shipment_side(
    side: &ShipmentSideInput,
    job_type: JobType,
    amount: &Amount,
    skills: &crate::problem::skill::SkillSet,
    priority: u32,
    matrix_size: usize,
    coordinates: &mut FxHashMap<usize, [f64; 2]>,
) -> Result<Job, SolverError> {
    let type_name = if job_type == JobType::Pickup {
        "pickup"
    } else {
        "delivery"
    };
    let location = task_location(
        side.location_index,
        side.location,
        matrix_size,
        coordinates,
        type_name,
        side.id,
    )?;

    let mut jb = JobBuilder::default();
    jb.set_id(side.id)
        .set_job_type(job_type)
        .set_location(location)
        .set_setup(scale_from_user_duration(side.setup))
        .set_service(scale_from_user_duration(side.service))
        .set_service_per_vehicle_type(scale_duration_map(&side.service_per_vehicle_type))
        .set_skills(skills.clone())
        .set_priority(priority)
        .set_tws(task_windows(&side.time_windows, side.id)?)
        .set_description(side.description.clone());
    match job_type {
        JobType::Pickup => jb.set_pickup(amount.clone()),
        _ => jb.set_delivery(amount.clone()),
    };
    Ok(jb.build())
}

fn scale_duration_map(map: &BTreeMap<String, UserDuration>) -> FxHashMap<String, Duration> {
    map.iter()
        .map(|(k, &v)| (k.clone(), scale_from_user_duration(v)))
        .collect()
}

fn check_priority(priority: u32, id: Id) -> Result<u32, SolverError> {
    if priority > MAX_PRIORITY {
        return Err(SolverError::Input(format!(
            "Invalid priority value for {id}."
        )));
    }
    Ok(priority)
}

fn get_amount(
    values: Option<&Vec<i64>>,
    amount_size: usize,
    key: &str,
    id: Id,
) -> Result<Amount, SolverError> {
    match values {
        Some(values) => {
            if values.len() != amount_size {
                return Err(SolverError::Input(format!(
                    "Inconsistent {key} length for {id}: {} and {amount_size}.",
                    values.len()
                )));
            }
            if values.iter().any(|&v| v < 0) {
                return Err(SolverError::Input(format!("Invalid {key} value for {id}.")));
            }
            Ok(Amount::from_vec(values.clone()))
        }
        None => Ok(Amount::zeros(amount_size)),
    }
}

/// Sorted, validated task windows; absent means the full horizon.
fn task_windows(
    windows: &Option<Vec<[UserDuration; 2]>>,
    id: Id,
) -> Result<TimeWindows, SolverError> {
    match windows {
        None => Ok(TimeWindows::full_horizon()),
        Some(windows) => {
            if windows.is_empty() {
                return Err(SolverError::Input(format!(
                    "Invalid time_windows array for object {id}."
                )));
            }
            check_windows(windows, id, "object")?;
            Ok(TimeWindows::from_sorted(
                windows
                    .iter()
                    .map(|&[start, end]| TimeWindow::from_user(start, end))
                    .collect(),
            ))
        }
    }
}

/// `start <= end` per window, and non-overlapping once sorted.
fn check_windows(windows: &[[UserDuration; 2]], id: Id, kind: &str) -> Result<(), SolverError> {
    for window in windows {
        if window[0] > window[1] {
            return Err(SolverError::Input(format!(
                "Invalid time window for {kind} {id}."
            )));
        }
    }
    let mut sorted: Vec<[UserDuration; 2]> = windows.to_vec();
    sorted.sort();
    for pair in sorted.windows(2) {
        if pair[1][0] <= pair[0][1] {
            return Err(SolverError::Input(format!(
                "Overlapping time windows for {kind} {id}."
            )));
        }
    }
    Ok(())
}

fn check_square<T: Copy + Default>(
    rows: Vec<Vec<T>>,
    kind: &str,
) -> Result<Matrix<T>, SolverError> {
    let size = rows.len();
    if rows.iter().any(|row| row.len() != size) {
        return Err(SolverError::Input(format!(
            "Unexpected {kind} matrix line length."
        )));
    }
    Ok(Matrix::from_rows(rows))
}

fn task_location(
    index: Option<usize>,
    coords: Option<[f64; 2]>,
    matrix_size: usize,
    coordinates: &mut FxHashMap<usize, [f64; 2]>,
    kind: &str,
    id: Id,
) -> Result<LocationIdx, SolverError> {
    match optional_rank(index, coords, matrix_size, coordinates, kind, id)? {
        Some(rank) => Ok(rank),
        None => Err(SolverError::Input(format!(
            "Invalid location for {kind} {id}."
        ))),
    }
}

/// Resolves an optional matrix rank, recording advisory coordinates for the
/// output echo. Coordinates without an index cannot be resolved without a
/// routing adapter.
fn optional_rank(
    index: Option<usize>,
    coords: Option<[f64; 2]>,
    matrix_size: usize,
    coordinates: &mut FxHashMap<usize, [f64; 2]>,
    key: &str,
    id: Id,
) -> Result<Option<LocationIdx>, SolverError> {
    match index {
        Some(rank) => {
            if rank >= matrix_size {
                return Err(SolverError::Input(format!(
                    "Out of range {key} for {id}: {rank}."
                )));
            }
            if let Some(coords) = coords {
                coordinates.insert(rank, coords);
            }
            Ok(Some(LocationIdx::new(rank)))
        }
        None => {
            if coords.is_some() {
                return Err(SolverError::Routing(format!(
                    "Coordinates for {key} of {id} need a routing adapter; provide explicit indices and matrices."
                )));
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::scale::DURATION_FACTOR;

    #[test]
    fn test_requires_tasks_and_vehicles() {
        assert!(matches!(
            parse_problem(r#"{"vehicles": [{"id": 1}]}"#),
            Err(SolverError::Input(_))
        ));
        assert!(matches!(
            parse_problem(r#"{"jobs": [{"id": 1, "location_index": 0}], "matrix": [[0]]}"#),
            Err(SolverError::Input(_))
        ));
    }

    #[test]
    fn test_deprecated_matrix_maps_to_car_durations() {
        let problem = parse_problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0}],
                "jobs": [{"id": 1, "location_index": 1}],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        )
        .unwrap();
        assert_eq!(problem.profiles().len(), 1);
        assert_eq!(problem.profiles()[0].name(), "car");
        let travel = problem.travel(crate::problem::vehicle::VehicleIdx::new(0));
        assert_eq!(
            travel.duration(LocationIdx::new(0), LocationIdx::new(1)),
            5 * DURATION_FACTOR
        );
    }

    #[test]
    fn test_amount_dimension_mismatch_is_rejected() {
        let error = parse_problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "capacity": [1, 2]}],
                "jobs": [{"id": 1, "location_index": 1, "delivery": [1]}],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(error, SolverError::Input(_)));
        assert!(error.to_string().contains("delivery"));
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let error = parse_problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0}],
                "jobs": [{"id": 1, "location_index": 9}],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(error, SolverError::Input(_)));
    }

    #[test]
    fn test_non_square_matrix_is_rejected() {
        let error = parse_problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0}],
                "jobs": [{"id": 1, "location_index": 1}],
                "matrix": [[0, 5, 1], [5, 0]]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(error, SolverError::Input(_)));
    }

    #[test]
    fn test_multiple_windows_expand_vehicle() {
        let problem = parse_problem(
            r#"{
                "vehicles": [{
                    "id": 1, "start_index": 0,
                    "time_windows": [[0, 100], [200, 300]]
                }],
                "jobs": [{"id": 1, "location_index": 1}],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        )
        .unwrap();
        assert_eq!(problem.vehicles().len(), 2);
        assert_eq!(problem.vehicles()[0].id(), 1);
        assert_eq!(problem.vehicles()[1].id(), 1);
        assert_eq!(problem.vehicles()[0].tw().end, 100 * DURATION_FACTOR);
        assert_eq!(problem.vehicles()[1].tw().start, 200 * DURATION_FACTOR);
    }

    #[test]
    fn test_legacy_amount_means_delivery() {
        let problem = parse_problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "capacity": [3]}],
                "jobs": [{"id": 1, "location_index": 1, "amount": [2]}],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        )
        .unwrap();
        let job = problem.job(crate::problem::job::JobIdx::new(0));
        assert_eq!(job.delivery(), &Amount::from_vec(vec![2]));
        assert!(job.pickup().is_zero());
    }

    #[test]
    fn test_speed_factor_bound() {
        let error = parse_problem(
            r#"{
                "vehicles": [{"id": 1, "start_index": 0, "speed_factor": 7.5}],
                "jobs": [{"id": 1, "location_index": 1}],
                "matrix": [[0, 5], [5, 0]]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(error, SolverError::Input(_)));
    }

    #[test]
    fn test_missing_matrices_is_a_routing_error() {
        let error = parse_problem(
            r#"{
                "vehicles": [{"id": 1}],
                "jobs": [{"id": 1, "location_index": 0}]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(error, SolverError::Routing(_)));
    }
}
