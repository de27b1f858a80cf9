//! Token-bucket rate limiting for outbound provider requests.
//!
//! One bucket per provider. The bucket itself is synchronous and guarded by
//! a mutex that is never held across I/O; waiting is done by computing the
//! refill deadline under the lock and sleeping outside it.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Rate limit configuration for one provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    /// Sustained requests per second.
    pub requests_per_second: f64,
    /// Burst capacity (max tokens).
    pub burst_capacity: u64,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_second: 2.0,
            burst_capacity: 5,
        }
    }
}

impl RateLimit {
    /// Clamp degenerate configurations into something usable.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if !self.requests_per_second.is_finite() || self.requests_per_second < 0.0 {
            self.requests_per_second = 0.0;
        }
        if self.burst_capacity == 0 && self.requests_per_second > 0.0 {
            self.burst_capacity = 1;
        }
        self
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket with blocking async acquisition.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u64,
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a bucket that starts full.
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        let limit = limit.normalized();
        Self {
            capacity: limit.burst_capacity,
            refill_rate: limit.requests_per_second,
            state: Mutex::new(BucketState {
                tokens: limit.burst_capacity as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).clamp(0.0, self.capacity as f64);
        state.last_refill = now;
    }

    /// Try to take one token without waiting.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Take one token, sleeping until the bucket refills if necessary.
    ///
    /// The lock is released while sleeping.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                if self.refill_rate <= 0.0 {
                    // A zero-rate bucket never refills; yield a long beat so
                    // callers at least observe cancellation.
                    Duration::from_secs(1)
                } else {
                    Duration::from_secs_f64((1.0 - state.tokens) / self.refill_rate)
                }
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Tokens currently available, after refill.
    pub fn available(&self) -> u64 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens as u64
    }
}
