use serde::Serialize;
use smallvec::SmallVec;

use crate::problem::scale::{scale_from_user_duration, Duration, UserDuration};

/// Closed interval on the tick time line. A window constrains the start of
/// service at a step; arriving early means waiting, arriving past `end` is
/// infeasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: Duration,
    pub end: Duration,
}

impl TimeWindow {
    /// Default horizon when no window is provided.
    pub const FULL_HORIZON: TimeWindow = TimeWindow {
        start: 0,
        end: scale_from_user_duration(UserDuration::MAX),
    };

    pub fn from_user(start: UserDuration, end: UserDuration) -> Self {
        TimeWindow {
            start: scale_from_user_duration(start),
            end: scale_from_user_duration(end),
        }
    }

    pub fn contains(&self, t: Duration) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn is_default(&self) -> bool {
        *self == Self::FULL_HORIZON
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

/// Sorted, non-overlapping window list.
#[derive(Debug, Clone, Serialize)]
pub struct TimeWindows(SmallVec<[TimeWindow; 1]>);

impl TimeWindows {
    pub fn single(tw: TimeWindow) -> Self {
        TimeWindows(smallvec::smallvec![tw])
    }

    pub fn full_horizon() -> Self {
        Self::single(TimeWindow::FULL_HORIZON)
    }

    /// Builds from already validated windows; sorts by start.
    pub fn from_sorted(mut windows: Vec<TimeWindow>) -> Self {
        windows.sort_by_key(|tw| (tw.start, tw.end));
        TimeWindows(SmallVec::from_vec(windows))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> &TimeWindow {
        &self.0[0]
    }

    pub fn last(&self) -> &TimeWindow {
        &self.0[self.0.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeWindow> {
        self.0.iter()
    }

    /// Earliest feasible service start at or after `t`, or None when every
    /// window has closed.
    pub fn earliest_start_from(&self, t: Duration) -> Option<Duration> {
        self.0
            .iter()
            .find(|tw| t <= tw.end)
            .map(|tw| t.max(tw.start))
    }

    /// Latest feasible service start at or before `t`, or None when `t` is
    /// before every window opens.
    pub fn latest_start_until(&self, t: Duration) -> Option<Duration> {
        self.0
            .iter()
            .rev()
            .find(|tw| tw.start <= t)
            .map(|tw| t.min(tw.end))
    }

    pub fn is_satisfied(&self, t: Duration) -> bool {
        self.0.iter().any(|tw| tw.contains(t))
    }

    /// Excess over the last window close, for violation reporting. Zero while
    /// some window can still accommodate `t`.
    pub fn delay_at(&self, t: Duration) -> Duration {
        match self.earliest_start_from(t) {
            Some(_) => 0,
            None => t - self.last().end,
        }
    }
}
