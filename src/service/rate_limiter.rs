use std::sync::Mutex;
use std::time::{Duration, Instant};

use snafu::{ensure, Snafu};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Tokens added back per second.
    pub refill_per_second: f64,
    /// Maximum number of tokens, i.e. the largest burst admitted at once.
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            refill_per_second: 1.0,
            burst: 3,
        }
    }
}

#[derive(Debug, Snafu, Clone, PartialEq)]
pub enum RateLimitConfigError {
    #[snafu(display("rate limit refill must be a positive number, got {refill}"))]
    InvalidRefill { refill: f64 },
    #[snafu(display("rate limit burst must be at least 1"))]
    ZeroBurst,
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), RateLimitConfigError> {
        let refill = self.refill_per_second;
        ensure!(
            refill.is_finite() && refill > 0.0,
            InvalidRefillSnafu { refill }
        );
        ensure!(self.burst > 0, ZeroBurstSnafu);
        Ok(())
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket admission control. Starts full.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_per_second: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    fn starting_at(config: RateLimitConfig, now: Instant) -> Self {
        let capacity = f64::from(config.burst);

        Self {
            capacity,
            refill_per_second: config.refill_per_second,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: now,
            }),
        }
    }

    /// Take one token if one is available.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    pub fn allow_at(&self, now: Instant) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        if elapsed > Duration::ZERO {
            bucket.tokens =
                (bucket.tokens + elapsed.as_secs_f64() * self.refill_per_second).min(self.capacity);
            bucket.last_refill = now;
        }

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
