use rand::Rng;
use std::time::Duration;

/// Randomized pause used to model variable production and processing cost.
///
/// Each call sleeps the current thread for a uniformly random duration in
/// `[0, max_delay)`. A zero bound turns pacing off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    max_delay: Duration,
}

impl Pacing {
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn next_delay(&self) -> Duration {
        let bound = self.max_delay.as_nanos().min(u128::from(u64::MAX)) as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        Duration::from_nanos(rng.random_range(0..bound))
    }

    /// Blocks the calling thread; only call this from worker threads.
    pub fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_stays_below_bound() {
        let pacing = Pacing::new(Duration::from_micros(200));
        for _ in 0..1000 {
            assert!(pacing.next_delay() < Duration::from_micros(200));
        }
    }

    #[test]
    fn test_zero_bound_never_sleeps() {
        let pacing = Pacing::disabled();
        assert_eq!(pacing.next_delay(), Duration::ZERO);
        assert_eq!(Pacing::new(Duration::from_nanos(1)).next_delay(), Duration::ZERO);
    }
}
