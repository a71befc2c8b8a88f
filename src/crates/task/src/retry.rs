//! Retry policies for task attempts
//!
//! The executor asks a [`RetryStrategy`] what to do after every failed
//! attempt. [`RetryPolicy`] is the stock strategy: exponential backoff capped
//! at `max_interval`, optional jitter, and a choice between retrying every
//! operation error or only the ones that look transient.

use crate::error::AttemptFailure;
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then try again
    Retry { delay: Duration },
    /// Give up and surface the failure
    Stop,
}

/// Decides whether and when a failed attempt is retried
pub trait RetryStrategy: Send + Sync + fmt::Debug {
    /// Total attempts allowed, including the first
    fn max_attempts(&self) -> usize;

    /// Decide after attempt number `attempt` (1-based) failed with `failure`
    fn decide(&self, failure: &AttemptFailure, attempt: usize) -> RetryDecision;
}

/// Which operation errors are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryOn {
    /// Every operation error
    #[default]
    AnyError,
    /// Only errors whose message looks transient, see [`is_retryable_error`]
    TransientOnly,
}

/// Exponential backoff retry policy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: usize,

    /// Initial interval between retries in seconds
    pub initial_interval: f64,

    /// Multiplier for the interval after each retry
    pub backoff_factor: f64,

    /// Maximum interval between retries in seconds
    pub max_interval: f64,

    /// Whether to add random jitter to intervals
    pub jitter: bool,

    /// Whether an attempt that hit the timeout is retried
    pub retry_timeouts: bool,

    pub retry_on: RetryOn,
}

impl RetryPolicy {
    /// Create a new retry policy with the given max attempts
    ///
    /// ```rust
    /// use agentic_task::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(3);
    /// assert_eq!(policy.max_attempts, 3);
    /// assert!(policy.retry_timeouts);
    /// ```
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_interval: 0.5,
            backoff_factor: 2.0,
            max_interval: 128.0,
            jitter: true,
            retry_timeouts: true,
            retry_on: RetryOn::AnyError,
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    pub fn with_initial_interval(mut self, seconds: f64) -> Self {
        self.initial_interval = seconds;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_max_interval(mut self, seconds: f64) -> Self {
        self.max_interval = seconds;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_retry_timeouts(mut self, retry_timeouts: bool) -> Self {
        self.retry_timeouts = retry_timeouts;
        self
    }

    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Calculate the delay after the given retry number (0-indexed)
    ///
    /// `initial_interval * backoff_factor ^ retry`, capped at `max_interval`,
    /// then multiplied by a random factor in `[0.5, 1.5]` when jitter is on.
    pub fn calculate_delay(&self, retry: usize) -> Duration {
        if retry >= self.max_attempts {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let base_delay = self.initial_interval * self.backoff_factor.powi(exponent);
        let capped_delay = base_delay.min(self.max_interval);

        let final_delay = if self.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..=1.5);
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::try_from_secs_f64(final_delay.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// Check if more attempts are allowed after `attempts` attempts
    pub fn should_retry(&self, attempts: usize) -> bool {
        attempts < self.max_attempts
    }

    fn is_retryable(&self, failure: &AttemptFailure) -> bool {
        match failure {
            AttemptFailure::Timeout(_) => self.retry_timeouts,
            AttemptFailure::Operation(source) => match self.retry_on {
                RetryOn::AnyError => true,
                RetryOn::TransientOnly => is_retryable_error(&source.to_string()),
            },
            AttemptFailure::Telemetry(_) => false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryStrategy for RetryPolicy {
    fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn decide(&self, failure: &AttemptFailure, attempt: usize) -> RetryDecision {
        if !self.should_retry(attempt) || !self.is_retryable(failure) {
            return RetryDecision::Stop;
        }

        RetryDecision::Retry {
            delay: self.calculate_delay(attempt.saturating_sub(1)),
        }
    }
}

/// Retry bookkeeping for one call
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Number of attempts made so far
    pub attempts: usize,

    /// Last error message
    pub last_error: Option<String>,

    /// Delay slept before the latest retry
    pub last_delay: Duration,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt
    pub fn record_attempt(&mut self, error: Option<String>) {
        self.attempts += 1;
        self.last_error = error;
    }

    /// Clamp a proposed delay so delays never shrink within one call
    pub fn next_delay(&mut self, proposed: Duration) -> Duration {
        let delay = proposed.max(self.last_delay);
        self.last_delay = delay;
        delay
    }
}

/// Check if an error message indicates a transient error that should be retried
///
/// Recognizes timeouts, connection errors, rate limits, 5xx status codes and
/// unavailable services.
///
/// ```rust
/// use agentic_task::retry::is_retryable_error;
///
/// assert!(is_retryable_error("Connection timeout"));
/// assert!(is_retryable_error("503 Service Unavailable"));
/// assert!(!is_retryable_error("404 Not Found"));
/// ```
pub fn is_retryable_error(error_msg: &str) -> bool {
    let lower = error_msg.to_lowercase();

    lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("rate limit")
        || lower.contains("500")
        || lower.contains("502")
        || lower.contains("503")
        || lower.contains("504")
        || lower.contains("unavailable")
        || lower.contains("too many requests")
        || lower.contains("retry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_telemetry::TelemetryError;

    fn no_jitter(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(max_attempts)
            .with_initial_interval(1.0)
            .with_backoff_factor(2.0)
            .with_max_interval(10.0)
            .with_jitter(false)
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_interval, 0.5);
        assert_eq!(policy.backoff_factor, 2.0);
        assert_eq!(policy.max_interval, 128.0);
        assert!(policy.jitter);
        assert_eq!(policy.retry_on, RetryOn::AnyError);
    }

    #[test]
    fn test_calculate_delay_exponential_and_capped() {
        let policy = no_jitter(10);
        assert_eq!(policy.calculate_delay(0), Duration::from_secs(1));
        assert_eq!(policy.calculate_delay(1), Duration::from_secs(2));
        assert_eq!(policy.calculate_delay(2), Duration::from_secs(4));
        assert_eq!(policy.calculate_delay(3), Duration::from_secs(8));
        assert_eq!(policy.calculate_delay(4), Duration::from_secs(10));
        assert_eq!(policy.calculate_delay(10), Duration::ZERO);
    }

    #[test]
    fn test_calculate_delay_with_jitter_in_range() {
        let policy = no_jitter(5).with_jitter(true);
        for _ in 0..100 {
            let delay = policy.calculate_delay(1);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_decide_respects_max_attempts() {
        let policy = no_jitter(3);
        let failure = AttemptFailure::Operation("boom".into());

        assert_eq!(
            policy.decide(&failure, 1),
            RetryDecision::Retry {
                delay: Duration::from_secs(1)
            }
        );
        assert_eq!(
            policy.decide(&failure, 2),
            RetryDecision::Retry {
                delay: Duration::from_secs(2)
            }
        );
        assert_eq!(policy.decide(&failure, 3), RetryDecision::Stop);
    }

    #[test]
    fn test_decide_timeouts() {
        let failure = AttemptFailure::Timeout(Duration::from_millis(10));
        assert!(matches!(no_jitter(3).decide(&failure, 1), RetryDecision::Retry { .. }));
        assert_eq!(
            no_jitter(3).with_retry_timeouts(false).decide(&failure, 1),
            RetryDecision::Stop
        );
    }

    #[test]
    fn test_decide_transient_only() {
        let policy = no_jitter(3).with_retry_on(RetryOn::TransientOnly);

        let transient = AttemptFailure::Operation("429 Too Many Requests".into());
        let permanent = AttemptFailure::Operation("401 Unauthorized".into());

        assert!(matches!(policy.decide(&transient, 1), RetryDecision::Retry { .. }));
        assert_eq!(policy.decide(&permanent, 1), RetryDecision::Stop);
    }

    #[test]
    fn test_telemetry_failures_are_not_retried() {
        let failure = AttemptFailure::Telemetry(TelemetryError::TracerAlreadySet);
        assert_eq!(no_jitter(5).decide(&failure, 1), RetryDecision::Stop);
    }

    #[test]
    fn test_retry_state_delays_never_shrink() {
        let mut state = RetryState::new();
        assert_eq!(state.next_delay(Duration::from_millis(300)), Duration::from_millis(300));
        assert_eq!(state.next_delay(Duration::from_millis(100)), Duration::from_millis(300));
        assert_eq!(state.next_delay(Duration::from_millis(900)), Duration::from_millis(900));

        state.record_attempt(Some("boom".to_string()));
        assert_eq!(state.attempts, 1);
        assert_eq!(state.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error("Connection refused"));
        assert!(is_retryable_error("Request timeout"));
        assert!(is_retryable_error("Rate limit exceeded"));
        assert!(is_retryable_error("502 Bad Gateway"));
        assert!(is_retryable_error("Service Unavailable"));

        assert!(!is_retryable_error("Invalid input"));
        assert!(!is_retryable_error("401 Unauthorized"));
    }
}
