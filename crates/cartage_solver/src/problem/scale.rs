use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// User-facing integer domains: seconds, meters and cost units as they appear
/// in the input document.
pub type UserDuration = u32;
pub type UserDistance = u32;
pub type UserCost = u32;

/// Internal integer domains. Durations are ticks of 1/100 s, distances stay
/// in meters, costs are scaled so that integer arithmetic is exact.
pub type Duration = i64;
pub type Distance = i64;
pub type Cost = i64;

pub type Id = u64;
pub type Priority = u32;
pub type SkillValue = u32;

/// Internal time measure is the hundredth of a second.
pub const DURATION_FACTOR: Duration = 100;

/// Scales distances consistently when they enter cost evaluations.
pub const DISTANCE_FACTOR: Distance = 360;

/// Costs derive from travel times through a per-hour rate, so all costs are
/// scaled to avoid floating point while staying rounding-free.
pub const COST_FACTOR: Cost = 3600;

/// A cost of one per second, so duration and cost output identical values
/// when per-hour rates are left unset.
pub const DEFAULT_COST_PER_HOUR: UserCost = 3600;
pub const DEFAULT_COST_PER_KM: UserCost = 0;

/// Setting the max value would overflow on further additions.
pub const INFINITE_USER_COST: UserCost = 3 * (u32::MAX / 4);
pub const INFINITE_COST: Cost = 3 * (i64::MAX / 4);

pub const MAX_PRIORITY: Priority = 100;
pub const MAX_SPEED_FACTOR: f64 = 5.0;

pub const MAX_EXPLORATION_LEVEL: u32 = 5;
pub const DEFAULT_EXPLORATION_LEVEL: u32 = 5;
pub const DEFAULT_THREADS: usize = 4;

pub const DEFAULT_MAX_TASKS: usize = usize::MAX;
pub const DEFAULT_MAX_TRAVEL_TIME: Duration = Duration::MAX;
pub const DEFAULT_MAX_DISTANCE: Distance = Distance::MAX;

#[inline]
pub const fn scale_from_user_duration(d: UserDuration) -> Duration {
    DURATION_FACTOR * d as Duration
}

#[inline]
pub const fn scale_to_user_duration(d: Duration) -> UserDuration {
    debug_assert!(d <= scale_from_user_duration(UserDuration::MAX));
    (d / DURATION_FACTOR) as UserDuration
}

#[inline]
pub const fn scale_from_user_cost(c: UserCost) -> Cost {
    DURATION_FACTOR * COST_FACTOR * c as Cost
}

#[inline]
pub const fn scale_to_user_cost(c: Cost) -> UserCost {
    debug_assert!(c <= scale_from_user_cost(UserCost::MAX));
    (c / (DURATION_FACTOR * COST_FACTOR)) as UserCost
}

/// Cost, duration and distance of a route fragment, or the delta thereof.
/// The triple is the currency of the evaluator and of operator gains; orderings
/// and feasibility bounds consult the components separately, never a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Eval {
    pub cost: Cost,
    pub duration: Duration,
    pub distance: Distance,
}

impl Eval {
    pub const ZERO: Eval = Eval {
        cost: 0,
        duration: 0,
        distance: 0,
    };

    pub const fn new(cost: Cost, duration: Duration, distance: Distance) -> Self {
        Eval {
            cost,
            duration,
            distance,
        }
    }

    /// Strictly improving as a delta: the scaled cost goes down.
    pub fn is_improvement(&self) -> bool {
        self.cost < 0
    }
}

impl Add for Eval {
    type Output = Eval;

    fn add(self, rhs: Eval) -> Eval {
        Eval {
            cost: self.cost + rhs.cost,
            duration: self.duration + rhs.duration,
            distance: self.distance + rhs.distance,
        }
    }
}

impl Sub for Eval {
    type Output = Eval;

    fn sub(self, rhs: Eval) -> Eval {
        Eval {
            cost: self.cost - rhs.cost,
            duration: self.duration - rhs.duration,
            distance: self.distance - rhs.distance,
        }
    }
}

impl Neg for Eval {
    type Output = Eval;

    fn neg(self) -> Eval {
        Eval {
            cost: -self.cost,
            duration: -self.duration,
            distance: -self.distance,
        }
    }
}

impl AddAssign for Eval {
    fn add_assign(&mut self, rhs: Eval) {
        self.cost += rhs.cost;
        self.duration += rhs.duration;
        self.distance += rhs.distance;
    }
}

impl SubAssign for Eval {
    fn sub_assign(&mut self, rhs: Eval) {
        self.cost -= rhs.cost;
        self.duration -= rhs.duration;
        self.distance -= rhs.distance;
    }
}

impl std::iter::Sum for Eval {
    fn sum<I: Iterator<Item = Eval>>(iter: I) -> Eval {
        iter.fold(Eval::ZERO, |acc, e| acc + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_round_trip() {
        for d in [0u32, 1, 59, 3600, 86_400, UserDuration::MAX] {
            assert_eq!(scale_to_user_duration(scale_from_user_duration(d)), d);
        }
    }

    #[test]
    fn test_cost_round_trip() {
        for c in [0u32, 1, 3600, 1_000_000, UserCost::MAX] {
            assert_eq!(scale_to_user_cost(scale_from_user_cost(c)), c);
        }
    }

    #[test]
    fn test_default_per_hour_makes_cost_match_duration() {
        // One hour of travel at the default rate costs exactly one hour.
        let d: UserDuration = 3600;
        let cost = d as Cost * DEFAULT_COST_PER_HOUR as Cost * DURATION_FACTOR;
        assert_eq!(scale_to_user_cost(cost), d);
    }

    #[test]
    fn test_infinite_cost_is_addable() {
        assert!(INFINITE_COST.checked_add(INFINITE_COST / 3).is_some());
        assert!(INFINITE_USER_COST.checked_add(INFINITE_USER_COST / 3).is_some());
    }

    #[test]
    fn test_eval_arithmetic() {
        let a = Eval::new(10, 20, 30);
        let b = Eval::new(1, 2, 3);
        assert_eq!(a + b, Eval::new(11, 22, 33));
        assert_eq!(a - b, Eval::new(9, 18, 27));
        assert_eq!(-b, Eval::new(-1, -2, -3));
        assert!(Eval::new(-1, 5, 5).is_improvement());
        assert!(!Eval::ZERO.is_improvement());
    }
}
