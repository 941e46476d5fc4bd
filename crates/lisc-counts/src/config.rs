//! Collection options and their environment configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::rate_limit::RateLimiter;

/// Default spacing between requests: about three per second, the ceiling
/// for E-Utilities clients without an API key.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(340);

/// Default fraction of failed lookups tolerated before a sweep fails.
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.1;

/// Options for one collection sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectOptions {
    /// Minimum spacing between consecutive remote calls.
    pub min_interval: Duration,

    /// Calls between cooldowns; `None` disables the cooldown.
    pub burst_size: Option<u32>,

    /// Length of each cooldown.
    pub burst_pause: Duration,

    /// Largest tolerated fraction of failed lookups, in `[0, 1]`.
    pub failure_threshold: f64,

    /// Maximum records per lookup. Counts only need the total, so the
    /// collection engine ignores it.
    pub retmax: Option<u32>,

    /// Fetch the database description at the start of each sweep and keep
    /// it in the request log. Costs one extra request.
    #[serde(default)]
    pub collect_info: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            burst_size: None,
            burst_pause: Duration::ZERO,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            retmax: None,
            collect_info: false,
        }
    }
}

impl CollectOptions {
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Pause for `pause` after every `size` calls.
    pub fn with_burst(mut self, size: u32, pause: Duration) -> Self {
        self.burst_size = Some(size);
        self.burst_pause = pause;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: f64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_collect_info(mut self, collect_info: bool) -> Self {
        self.collect_info = collect_info;
        self
    }

    /// Checks that every option is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.failure_threshold) {
            return Err(ConfigError::InvalidValue {
                name: "failure_threshold".to_string(),
                reason: format!("{} is outside [0, 1]", self.failure_threshold),
            });
        }
        if self.burst_size == Some(0) {
            return Err(ConfigError::InvalidValue {
                name: "burst_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Builds the rate limiter these options describe.
    pub fn limiter(&self) -> RateLimiter {
        let limiter = RateLimiter::new(self.min_interval);
        match self.burst_size {
            Some(size) => limiter.with_burst(size, self.burst_pause),
            None => limiter,
        }
    }

    /// Load options from environment variables.
    ///
    /// Optional:
    /// - `LISC_MIN_INTERVAL`: seconds between requests (default: 0.34)
    /// - `LISC_BURST_SIZE`: calls between cooldowns (default: disabled)
    /// - `LISC_BURST_PAUSE`: cooldown length in seconds (default: 0)
    /// - `LISC_FAILURE_THRESHOLD`: tolerated failure fraction (default: 0.1)
    /// - `LISC_COLLECT_INFO`: `true` to record database info (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();

        if let Some(value) = lookup("LISC_MIN_INTERVAL") {
            options.min_interval = parse_seconds("LISC_MIN_INTERVAL", &value)?;
        }
        if let Some(value) = lookup("LISC_BURST_SIZE") {
            let size = value.trim().parse().map_err(|e| ConfigError::InvalidValue {
                name: "LISC_BURST_SIZE".to_string(),
                reason: format!("{e}"),
            })?;
            options.burst_size = Some(size);
        }
        if let Some(value) = lookup("LISC_BURST_PAUSE") {
            options.burst_pause = parse_seconds("LISC_BURST_PAUSE", &value)?;
        }
        if let Some(value) = lookup("LISC_FAILURE_THRESHOLD") {
            options.failure_threshold =
                value.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    name: "LISC_FAILURE_THRESHOLD".to_string(),
                    reason: format!("{e}"),
                })?;
        }

        if let Some(value) = lookup("LISC_COLLECT_INFO") {
            options.collect_info =
                value.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    name: "LISC_COLLECT_INFO".to_string(),
                    reason: format!("{e}"),
                })?;
        }

        options.validate()?;
        Ok(options)
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        name: name.to_string(),
        reason,
    };
    let secs: f64 = value.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(format!("{e}")))
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An option or environment variable has an unusable value.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
