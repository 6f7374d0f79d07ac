//! Rate Limiting Implementation
//!
//! Per-caller sliding window rate limiting. Each caller's window is an ordered
//! queue of call timestamps, pruned lazily on every check and swept by
//! `cleanup` for idle callers.

mod limiter;
mod types;


pub use limiter::RateLimiter;
pub use types::RateLimitResult;
