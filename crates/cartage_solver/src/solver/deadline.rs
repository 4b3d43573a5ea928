use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// Optional monotonic-clock cutoff plus a cooperative stop flag, checked at
/// the top of every search iteration. Workers stop at a consistent state,
/// never mid-apply; raising the flag is equivalent to a deadline of "now".
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    instant: Option<Instant>,
    stop: Option<Arc<AtomicBool>>,
}

impl Deadline {
    pub fn none() -> Self {
        Deadline::default()
    }

    pub fn after(timeout: Duration) -> Self {
        Deadline {
            instant: Some(Instant::now() + timeout),
            stop: None,
        }
    }

    pub fn at(instant: Instant) -> Self {
        Deadline {
            instant: Some(instant),
            stop: None,
        }
    }

    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    #[inline]
    pub fn expired(&self) -> bool {
        if let Some(stop) = &self.stop {
            if stop.load(Ordering::Relaxed) {
                return true;
            }
        }
        match self.instant {
            Some(instant) => Instant::now() >= instant,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_expires() {
        assert!(!Deadline::none().expired());
    }

    #[test]
    fn test_past_deadline_expires() {
        let deadline = Deadline::at(Instant::now() - Duration::from_millis(1));
        assert!(deadline.expired());
    }

    #[test]
    fn test_stop_flag_expires() {
        let stop = Arc::new(AtomicBool::new(false));
        let deadline = Deadline::none().with_stop(Arc::clone(&stop));
        assert!(!deadline.expired());
        stop.store(true, Ordering::Relaxed);
        assert!(deadline.expired());
    }
}
