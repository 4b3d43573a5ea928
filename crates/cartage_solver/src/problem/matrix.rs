use crate::{
    define_index_newtype,
    problem::{
        location::LocationIdx,
        scale::{
            scale_from_user_cost, Cost, Distance, Duration, Eval, UserCost, UserDistance,
            UserDuration, DISTANCE_FACTOR, DURATION_FACTOR, INFINITE_COST, INFINITE_USER_COST,
        },
        vehicle::VehicleCosts,
    },
};

define_index_newtype!(ProfileIdx, ProfileMatrices);

/// Square matrix in flat row-major storage; the entry for a pair of location
/// ranks lives at `from * size + to`.
#[derive(Debug, Clone)]
pub struct Matrix<T> {
    size: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    pub fn new(size: usize) -> Self {
        Matrix {
            size,
            data: vec![T::default(); size * size],
        }
    }

    /// Builds from row vectors; squareness has been validated upstream.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let size = rows.len();
        debug_assert!(rows.iter().all(|row| row.len() == size));
        Matrix {
            size,
            data: rows.into_iter().flatten().collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn get(&self, from: usize, to: usize) -> T {
        self.data[from * self.size + to]
    }

    pub fn set(&mut self, from: usize, to: usize, value: T) {
        self.data[from * self.size + to] = value;
    }
}

/// Duration, distance and cost matrices for one routing profile. Durations
/// drive the time model and are required; distances default to zero and a
/// cost matrix, when present, overrides duration-derived costs.
#[derive(Debug, Clone)]
pub struct ProfileMatrices {
    name: String,
    durations: Matrix<UserDuration>,
    distances: Option<Matrix<UserDistance>>,
    costs: Option<Matrix<UserCost>>,
}

impl ProfileMatrices {
    pub fn new(
        name: String,
        durations: Matrix<UserDuration>,
        distances: Option<Matrix<UserDistance>>,
        costs: Option<Matrix<UserCost>>,
    ) -> Self {
        ProfileMatrices {
            name,
            durations,
            distances,
            costs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.durations.size()
    }

    pub fn has_costs(&self) -> bool {
        self.costs.is_some()
    }

    pub fn has_distances(&self) -> bool {
        self.distances.is_some()
    }
}

/// Per-vehicle travel oracle: profile matrices seen through the vehicle's
/// speed factor and cost rates. All lookups are scaled-integer exact; an edge
/// whose duration carries the missing-edge sentinel is unreachable.
#[derive(Clone, Copy)]
pub struct TravelView<'a> {
    matrices: &'a ProfileMatrices,
    costs: VehicleCosts,
    speed_factor: f64,
}

impl<'a> TravelView<'a> {
    pub fn new(matrices: &'a ProfileMatrices, costs: VehicleCosts, speed_factor: f64) -> Self {
        TravelView {
            matrices,
            costs,
            speed_factor,
        }
    }

    #[inline]
    pub fn is_reachable(&self, from: LocationIdx, to: LocationIdx) -> bool {
        from == to || self.matrices.durations.get(from.get(), to.get()) < INFINITE_USER_COST
    }

    /// Speed-adjusted travel time in ticks, rounded to the nearest tick.
    #[inline]
    pub fn duration(&self, from: LocationIdx, to: LocationIdx) -> Duration {
        if from == to {
            return 0;
        }
        let d = self.matrices.durations.get(from.get(), to.get());
        if d >= INFINITE_USER_COST {
            return INFINITE_COST;
        }
        (d as f64 * DURATION_FACTOR as f64 / self.speed_factor).round() as Duration
    }

    #[inline]
    pub fn distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        if from == to {
            return 0;
        }
        match &self.matrices.distances {
            Some(distances) => distances.get(from.get(), to.get()) as Distance,
            None => 0,
        }
    }

    /// Scaled edge cost. With a profile cost matrix the entry is scaled
    /// directly and the per-hour / per-km rates do not apply.
    #[inline]
    pub fn cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        if from == to {
            return 0;
        }
        if !self.is_reachable(from, to) {
            return INFINITE_COST;
        }

        if let Some(costs) = &self.matrices.costs {
            return scale_from_user_cost(costs.get(from.get(), to.get()));
        }

        let d = self.matrices.durations.get(from.get(), to.get());
        let duration_cost = (d as f64 * self.costs.per_hour as f64 * DURATION_FACTOR as f64
            / self.speed_factor)
            .round() as Cost;

        let meters = self.distance(from, to);
        let distance_cost = (meters * self.costs.per_km as Distance * DISTANCE_FACTOR + 500) / 1000;

        duration_cost + distance_cost
    }

    #[inline]
    pub fn eval(&self, from: LocationIdx, to: LocationIdx) -> Eval {
        Eval::new(
            self.cost(from, to),
            self.duration(from, to),
            self.distance(from, to),
        )
    }
}
