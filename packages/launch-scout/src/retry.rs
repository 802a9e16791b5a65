//! Retry delay policy shared by page fetching and inference calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay schedule between attempts.
///
/// `delay(n)` is the pause taken after the `n`-th failed attempt
/// (zero-based): `initial * multiplier^n`, clamped to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub multiplier: u32,
    pub max: Duration,
}

impl BackoffPolicy {
    /// Exponential backoff.
    pub fn exponential(initial: Duration, multiplier: u32, max: Duration) -> Self {
        Self {
            initial,
            multiplier,
            max,
        }
    }

    /// Constant delay between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial: delay,
            multiplier: 1,
            max: delay,
        }
    }

    /// Delay after the given zero-based failed attempt.
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = self.multiplier.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

impl Default for BackoffPolicy {
    /// Page fetch default: 2s, doubling, capped at one minute.
    fn default() -> Self {
        Self::exponential(Duration::from_secs(2), 2, Duration::from_secs(60))
    }
}
