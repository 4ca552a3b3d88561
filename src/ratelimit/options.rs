//! Rate limit options and their resolution against defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyguardError};

/// Default number of requests allowed per window.
pub const DEFAULT_LIMIT: u64 = 5;
/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Caller-supplied overrides. Unset fields keep the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitOptions {
    /// Number of requests allowed per window
    #[serde(default)]
    pub limit: Option<u64>,
    /// Window length in seconds
    #[serde(default)]
    pub window: Option<u64>,
}

impl RateLimitOptions {
    /// Options overriding only the limit.
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            window: None,
        }
    }

    /// Options overriding only the window.
    pub fn with_window(window: u64) -> Self {
        Self {
            limit: None,
            window: Some(window),
        }
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: RateLimitOptions) -> Self {
        Self {
            limit: other.limit.or(self.limit),
            window: other.window.or(self.window),
        }
    }
}

/// The effective, validated configuration of a rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitConfig {
    limit: u64,
    window: u64,
}

impl LimitConfig {
    /// Create a configuration, rejecting values the limiter cannot honor.
    pub fn new(limit: u64, window: u64) -> Result<Self> {
        if limit == 0 {
            return Err(TallyguardError::Config(
                "limit must be a positive integer".to_string(),
            ));
        }
        if i64::try_from(limit).is_err() {
            return Err(TallyguardError::Config(format!(
                "limit {} exceeds the counter range",
                limit
            )));
        }
        if window == 0 {
            return Err(TallyguardError::Config(
                "window must be a positive number of seconds".to_string(),
            ));
        }
        if i64::try_from(window).is_err() {
            return Err(TallyguardError::Config(format!(
                "window {} exceeds the expiry range",
                window
            )));
        }
        Ok(Self { limit, window })
    }

    /// Maximum requests allowed per window.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Window length in seconds.
    pub fn window(&self) -> u64 {
        self.window
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: DEFAULT_WINDOW_SECS,
        }
    }
}

/// Merge `overrides` onto `defaults` field by field and validate the result.
pub fn resolve(overrides: &RateLimitOptions, defaults: &LimitConfig) -> Result<LimitConfig> {
    LimitConfig::new(
        overrides.limit.unwrap_or(defaults.limit),
        overrides.window.unwrap_or(defaults.window),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LimitConfig::default();
        assert_eq!(config.limit(), 5);
        assert_eq!(config.window(), 60);
    }

    #[test]
    fn test_resolve_empty_options_keeps_defaults() {
        let config = resolve(&RateLimitOptions::default(), &LimitConfig::default()).unwrap();
        assert_eq!(config, LimitConfig::default());
    }

    #[test]
    fn test_resolve_partial_limit_override() {
        let config = resolve(&RateLimitOptions::with_limit(10), &LimitConfig::default()).unwrap();
        assert_eq!(config.limit(), 10);
        assert_eq!(config.window(), 60);
    }

    #[test]
    fn test_resolve_partial_window_override() {
        let config = resolve(&RateLimitOptions::with_window(1), &LimitConfig::default()).unwrap();
        assert_eq!(config.limit(), 5);
        assert_eq!(config.window(), 1);
    }

    #[test]
    fn test_resolve_rejects_zero_values() {
        let zero_limit = resolve(&RateLimitOptions::with_limit(0), &LimitConfig::default());
        assert!(matches!(zero_limit, Err(TallyguardError::Config(_))));

        let zero_window = resolve(&RateLimitOptions::with_window(0), &LimitConfig::default());
        assert!(matches!(zero_window, Err(TallyguardError::Config(_))));
    }

    #[test]
    fn test_new_rejects_limit_outside_counter_range() {
        assert!(LimitConfig::new(u64::MAX, 60).is_err());
    }

    #[test]
    fn test_merge_prefers_later_fields() {
        let file = RateLimitOptions {
            limit: Some(20),
            window: Some(30),
        };
        let merged = file.merge(RateLimitOptions::with_window(90));
        assert_eq!(merged.limit, Some(20));
        assert_eq!(merged.window, Some(90));
    }

    #[test]
    fn test_options_deserialize_partial_yaml() {
        let options: RateLimitOptions = serde_yaml::from_str("limit: 10\n").unwrap();
        assert_eq!(options, RateLimitOptions::with_limit(10));
    }
}
