//! Executor configuration
//!
//! Loaded from `AGENTIC_TASK_*` environment variables:
//!
//! | variable | type | default |
//! |---|---|---|
//! | `AGENTIC_TASK_TIMEOUT_MS` | u64 | unset (no timeout) |
//! | `AGENTIC_TASK_MAX_ATTEMPTS` | usize | `3` |
//! | `AGENTIC_TASK_INITIAL_INTERVAL_MS` | u64 | `500` |
//! | `AGENTIC_TASK_BACKOFF_FACTOR` | f64 | `2.0` |
//! | `AGENTIC_TASK_MAX_INTERVAL_MS` | u64 | `128000` |
//! | `AGENTIC_TASK_JITTER` | bool | `true` |

use crate::retry::RetryPolicy;
use agentic_common::config::{
    build_env_key, get_env_bool, get_env_parse, get_env_parse_or, ConfigBuilder,
};
use agentic_common::{CommonError, Result};
use std::time::Duration;

/// Default environment variable prefix
pub const ENV_PREFIX: &str = "AGENTIC_TASK_";

/// Timeout and retry settings for [`crate::TaskExecutor::with_config`]
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub timeout: Option<Duration>,
    pub max_attempts: usize,
    pub initial_interval: Duration,
    pub backoff_factor: f64,
    pub max_interval: Duration,
    pub jitter: bool,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(128),
            jitter: true,
        }
    }
}

impl TaskConfig {
    /// Load from the default `AGENTIC_TASK_` prefix
    pub fn load() -> Result<Self> {
        Self::from_env_with_defaults(ENV_PREFIX)
    }

    /// The retry policy these settings describe
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
            .with_initial_interval(self.initial_interval.as_secs_f64())
            .with_backoff_factor(self.backoff_factor)
            .with_max_interval(self.max_interval.as_secs_f64())
            .with_jitter(self.jitter)
    }
}

impl ConfigBuilder for TaskConfig {
    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(CommonError::config("max_attempts must be at least 1"));
        }
        if self.backoff_factor.is_nan() || self.backoff_factor < 1.0 {
            return Err(CommonError::config(format!(
                "backoff_factor must be at least 1.0 (got {})",
                self.backoff_factor
            )));
        }
        if self.initial_interval > self.max_interval {
            return Err(CommonError::config(format!(
                "initial_interval ({:?}) must not exceed max_interval ({:?})",
                self.initial_interval, self.max_interval
            )));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(CommonError::config("timeout must be greater than zero"));
        }
        Ok(())
    }

    fn from_env(prefix: &str) -> Result<Self> {
        let defaults = Self::default();
        let key = |name: &str| build_env_key(prefix, name);
        let millis_or = |name: &str, default: Duration| -> Result<Duration> {
            let ms = get_env_parse_or(&key(name), default_millis(default))?;
            Ok(Duration::from_millis(ms))
        };

        Ok(Self {
            timeout: get_env_parse::<u64>(&key("timeout_ms"))?.map(Duration::from_millis),
            max_attempts: get_env_parse_or(&key("max_attempts"), defaults.max_attempts)?,
            initial_interval: millis_or("initial_interval_ms", defaults.initial_interval)?,
            backoff_factor: get_env_parse_or(&key("backoff_factor"), defaults.backoff_factor)?,
            max_interval: millis_or("max_interval_ms", defaults.max_interval)?,
            jitter: get_env_bool(&key("jitter"))?.unwrap_or(defaults.jitter),
        })
    }

    fn merge(&mut self, other: Self) -> &mut Self {
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        self.max_attempts = other.max_attempts;
        self.initial_interval = other.initial_interval;
        self.backoff_factor = other.backoff_factor;
        self.max_interval = other.max_interval;
        self.jitter = other.jitter;
        self
    }
}

fn default_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
