//! Retry policy for page requests.
//!
//! The delay after failed attempt `k` (0-indexed) is `backoff_base^k` seconds
//! plus a jitter sample drawn uniformly from `[0, jitter)`.
//!
//! | Failed attempt | Delay with defaults (base 1.5) |
//! |----------------|--------------------------------|
//! | 0              | 1.0 s + jitter                 |
//! | 1              | 1.5 s + jitter                 |
//! | 2 (last of 3)  | none, the page is abandoned    |

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts per page, the first one included.
    pub max_attempts: u32,
    pub backoff_base: f64,
    /// Upper bound of the jitter range in seconds. `0.0`, or any value that
    /// is not a finite positive number, disables jitter.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: 1.5,
            jitter: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` for a given jitter sample.
    pub fn delay_for(&self, attempt: u32, jitter_secs: f64) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = (self.backoff_base.powi(exponent) + jitter_secs).max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Delay after failed attempt `attempt` with a fresh jitter sample.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.delay_for(attempt, self.sample_jitter())
    }

    fn sample_jitter(&self) -> f64 {
        if self.jitter.is_finite() && self.jitter > 0.0 {
            rand::rng().random_range(0.0..self.jitter)
        } else {
            0.0
        }
    }
}

/// Blocks the current thread between requests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
