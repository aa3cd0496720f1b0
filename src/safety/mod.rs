//! Safety Module
//!
//! Rate limiting for provider-backed operations.

mod rate_limiter;

pub use rate_limiter::RateLimiter;
