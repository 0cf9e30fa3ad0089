//! Retry delay schedule
//!
//! Delays grow exponentially from the initial delay, are capped per retry by
//! `max-delay-ms`, and are clamped so their sum never exceeds
//! `max-total-wait-ms`. With a multiplier of 1.0 and jitter disabled the
//! schedule is a plain fixed delay.

use crate::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Stateful delay generator for one request
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    multiplier: f64,
    max_delay: Duration,
    remaining: Duration,
    jitter: bool,
}

impl Backoff {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            next: config.initial_delay().min(config.max_delay()),
            multiplier: config.backoff_multiplier,
            max_delay: config.max_delay(),
            remaining: config.max_total_wait(),
            jitter: config.jitter,
        }
    }

    /// Returns the delay before the next retry, or `None` once the total wait
    /// budget has been spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let nominal = self.next;
        let mut delay = if self.jitter {
            add_jitter(nominal)
        } else {
            nominal
        };

        if delay > self.remaining {
            if self.remaining.is_zero() {
                return None;
            }
            delay = self.remaining;
        }
        self.remaining -= delay;

        let grown = Duration::from_nanos((nominal.as_nanos() as f64 * self.multiplier) as u64);
        self.next = grown.min(self.max_delay);

        Some(delay)
    }
}

/// Scales a delay by a random factor in [0.5, 1.0]
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
    Duration::from_nanos((delay.as_nanos() as f64 * factor) as u64)
}
