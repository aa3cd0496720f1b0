//! Rate Limiter
//!
//! Caps how often each pipeline step may hit the LLM provider.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Simple rate limiter using token bucket algorithm
pub struct RateLimiter {
    /// One bucket per pipeline step
    buckets: HashMap<String, TokenBucket>,
}

struct TokenBucket {
    tokens: u32,
    max_tokens: u32,
    last_refill: Instant,
    refill_rate: Duration,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_rate_secs: u64) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            last_refill: Instant::now(),
            refill_rate: Duration::from_secs(refill_rate_secs),
        }
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let elapsed = self.last_refill.elapsed();
        let refills = (elapsed.as_secs_f64() / self.refill_rate.as_secs_f64()) as u32;

        if refills > 0 {
            self.tokens = (self.tokens + refills).min(self.max_tokens);
            self.last_refill = Instant::now();
        }
    }

    fn reset(&mut self) {
        self.tokens = self.max_tokens;
        self.last_refill = Instant::now();
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        let mut buckets = HashMap::new();

        // Per-step quotas; contract generation is the most expensive call
        buckets.insert("clarify".to_string(), TokenBucket::new(10, 60));
        buckets.insert("schema".to_string(), TokenBucket::new(10, 60));
        buckets.insert("audit".to_string(), TokenBucket::new(10, 60));
        buckets.insert("generate".to_string(), TokenBucket::new(5, 60));
        buckets.insert("complete".to_string(), TokenBucket::new(10, 60));

        Self { buckets }
    }

    /// Check if a pipeline step may run now
    pub fn check_step(&mut self, step: &str) -> bool {
        if let Some(bucket) = self.buckets.get_mut(step) {
            bucket.try_consume()
        } else {
            true // Default allow if not configured
        }
    }

    /// Reset all rate limiters
    pub fn reset(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.reset();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_bucket() {
        let mut bucket = TokenBucket::new(3, 1);

        assert!(bucket.try_consume());
        assert!(bucket.try_consume());
        assert!(bucket.try_consume());
        assert!(!bucket.try_consume()); // Exhausted
    }

    #[test]
    fn test_step_quotas() {
        let mut limiter = RateLimiter::new();

        for _ in 0..5 {
            assert!(limiter.check_step("generate"));
        }
        // 6th generation within the window must wait
        assert!(!limiter.check_step("generate"));
        // Other steps are unaffected
        assert!(limiter.check_step("clarify"));
    }

    #[test]
    fn test_unknown_step_allowed() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check_step("healthz"));
    }

    #[test]
    fn test_reset_refills() {
        let mut limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.check_step("generate");
        }
        limiter.reset();
        assert!(limiter.check_step("generate"));
    }
}
