//! Core fixed-window rate limiter.

use std::sync::Arc;
use tracing::{debug, instrument, trace};

use super::options::{resolve, LimitConfig, RateLimitOptions};
use crate::error::{Result, TallyguardError};
use crate::store::CounterStore;

/// A fixed-window rate limiter over a shared counter store.
///
/// The limiter keeps no per-key state; every counter lives in the store under
/// the caller's key. It is cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct RateLimiter {
    /// Store holding the counters
    store: Arc<dyn CounterStore>,
    /// Effective configuration, fixed at construction
    config: LimitConfig,
}

impl RateLimiter {
    /// Create a rate limiter, merging `options` onto the defaults
    /// (`limit = 5`, `window = 60`).
    pub fn new(store: Arc<dyn CounterStore>, options: Option<RateLimitOptions>) -> Result<Self> {
        let config = resolve(&options.unwrap_or_default(), &LimitConfig::default())?;
        Ok(Self::with_config(store, config))
    }

    /// Create a rate limiter with an already resolved configuration.
    pub fn with_config(store: Arc<dyn CounterStore>, config: LimitConfig) -> Self {
        debug!(
            limit = config.limit(),
            window = config.window(),
            "Creating rate limiter"
        );
        Self { store, config }
    }

    /// Count a request against `key` and decide whether it is allowed.
    ///
    /// The first request of a window arms the key's expiry. Going over the
    /// limit returns `Ok(false)`; only store failures are errors.
    #[instrument(skip(self), level = "trace")]
    pub async fn limit(&self, key: &str) -> Result<bool> {
        let current = self.store.incr(key).await?;

        // Not atomic with the increment: a concurrent reader may briefly see
        // the counter without a TTL. The decision only depends on `current`.
        if current == 1 {
            debug!(key = %key, window = self.config.window(), "Starting new window");
            self.store.expire(key, self.config.window()).await?;
        }

        let allowed = current <= self.limit_i64();
        trace!(key = %key, current, allowed, "Checked rate limit");
        if !allowed {
            debug!(key = %key, current, limit = self.config.limit(), "Rate limit exceeded");
        }
        Ok(allowed)
    }

    /// Requests left in the current window for `key`.
    ///
    /// A key with no counter, or a blank stored value, has the full limit
    /// left. A non-integer count is a [`TallyguardError::Parse`]. The result
    /// is not clamped and goes negative once the limit has been exceeded.
    #[instrument(skip(self), level = "trace")]
    pub async fn remaining_attempts(&self, key: &str) -> Result<i64> {
        let limit = self.limit_i64();
        match self.store.get(key).await? {
            Some(raw) if !raw.trim().is_empty() => {
                let count: i64 = raw.trim().parse().map_err(|_| TallyguardError::Parse {
                    key: key.to_string(),
                    value: raw.clone(),
                })?;
                Ok(limit.saturating_sub(count))
            }
            _ => Ok(limit),
        }
    }

    /// Delete the counter for `key` so the next request opens a fresh window.
    #[instrument(skip(self), level = "trace")]
    pub async fn reset_limit(&self, key: &str) -> Result<()> {
        self.store.del(key).await?;
        debug!(key = %key, "Rate limit reset");
        Ok(())
    }

    /// Seconds until `key`'s window expires, as reported by the store.
    ///
    /// Store sentinels ([`crate::store::TTL_NO_EXPIRY`],
    /// [`crate::store::TTL_MISSING`]) are passed through unchanged.
    #[instrument(skip(self), level = "trace")]
    pub async fn ttl(&self, key: &str) -> Result<i64> {
        self.store.ttl(key).await
    }

    /// The effective configuration.
    pub fn options(&self) -> &LimitConfig {
        &self.config
    }

    fn limit_i64(&self) -> i64 {
        // LimitConfig::new guarantees the limit fits.
        self.config.limit() as i64
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
