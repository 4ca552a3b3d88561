//! Fixed-window rate limiting.

mod limiter;
mod options;

pub use limiter::RateLimiter;
pub use options::{resolve, LimitConfig, RateLimitOptions, DEFAULT_LIMIT, DEFAULT_WINDOW_SECS};
