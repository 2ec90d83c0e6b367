//! HTTP executor module
//!
//! The transport layer consumed by the dispatcher: retries with backoff,
//! token bucket rate limiting, and an in-memory response cache that paginated
//! continuation requests can bypass.

mod cache;
mod client;
mod rate_limit;

pub use cache::ResponseCache;
pub use client::{HttpExecutor, HttpRequest};
pub use rate_limit::{RateLimitConfig, RateLimiter};

#[cfg(test)]
mod tests;
