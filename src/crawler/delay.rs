use rand::Rng;
use std::time::Duration;

/// Randomized pause between two fetches
///
/// Durations are drawn uniformly from `[min, max]` with nanosecond
/// resolution. Bounds given in the wrong order are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    min: Duration,
    max: Duration,
}

impl PolitenessDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn bounds(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }

    /// Draws one delay from the thread-local generator
    pub fn next_delay(&self) -> Duration {
        self.sample(&mut rand::thread_rng())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = nanos(self.min);
        let max = nanos(self.max);
        Duration::from_nanos(rng.gen_range(min..=max))
    }
}

/// Saturates at roughly 584 years
fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl Default for PolitenessDelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(7), Duration::from_secs(10))
    }
}
