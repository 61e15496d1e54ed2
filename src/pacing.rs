//! Request pacing.
//!
//! All requests to the origin and its proxies are spaced by a randomized
//! pause. The pause is chosen by an injected [`DelayPolicy`] so tests can
//! swap in a deterministic one.

use crate::config::DelayBounds;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

pub trait DelayPolicy {
    /// Pick a pause within `[min, max]`.
    fn delay(&mut self, min: Duration, max: Duration) -> Duration;
}

/// Uniformly random pauses rounded to whole milliseconds.
#[derive(Debug)]
pub struct RandomDelay {
    rng: StdRng,
}

impl RandomDelay {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }
}

impl Default for RandomDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayPolicy for RandomDelay {
    fn delay(&mut self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let millis = self
            .rng
            .random_range(min.as_millis() as u64..=max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Never pauses.
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

#[cfg(test)]
impl DelayPolicy for NoDelay {
    fn delay(&mut self, _min: Duration, _max: Duration) -> Duration {
        Duration::ZERO
    }
}

/// Sleep for a pause drawn from `policy` within `bounds`.
pub async fn pause<P: DelayPolicy + ?Sized>(policy: &mut P, bounds: &DelayBounds) -> Duration {
    let delay = policy.delay(bounds.min(), bounds.max());
    debug!(?delay, "Pausing before next request");
    sleep(delay).await;
    delay
}
