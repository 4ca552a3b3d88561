//! Counter store abstraction.
//!
//! A counter store is the external service that owns every counter record.
//! It must serialize concurrent increments on the same key; the rate limiter
//! performs no locking of its own.

mod memory;
mod redis;

pub use memory::InMemoryStore;
pub use redis::RedisStore;

use async_trait::async_trait;

use crate::error::Result;

/// `TTL` result for a key that exists but has no expiry.
pub const TTL_NO_EXPIRY: i64 = -1;
/// `TTL` result for a key that does not exist.
pub const TTL_MISSING: i64 = -2;

/// Atomic counter operations over string keys.
///
/// Semantics follow the Redis commands of the same name.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment the counter, treating a missing key as 0, and
    /// return the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Set a time-to-live on the key.
    async fn expire(&self, key: &str, seconds: u64) -> Result<()>;

    /// Read the raw stored value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove the key.
    async fn del(&self, key: &str) -> Result<()>;

    /// Remaining seconds to live, or [`TTL_NO_EXPIRY`] / [`TTL_MISSING`].
    async fn ttl(&self, key: &str) -> Result<i64>;
}
