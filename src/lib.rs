//! Tallyguard - Fixed-Window Rate Limiting
//!
//! This crate implements a fixed-window request rate limiter. Counters live in
//! an external atomic counter store (Redis, or an in-process substitute), so
//! one limiter instance can be shared by every caller and every key.

pub mod config;
pub mod error;
pub mod ratelimit;
pub mod store;

pub use error::{Result, TallyguardError};
pub use ratelimit::{LimitConfig, RateLimitOptions, RateLimiter};
pub use store::{CounterStore, InMemoryStore, RedisStore};
