//! Task error types
//!
//! [`TaskError`] is what callers of the executor see. [`AttemptFailure`] is
//! the failure of a single attempt, which the retry strategy inspects before
//! it becomes terminal.

use crate::schema::ValidationError;
use agentic_common::error::BoxError;
use agentic_telemetry::{ExceptionInfo, RecordableError, TelemetryError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which side of the call failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    Input,
    Output,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Terminal error of a task call
#[derive(Debug, Error)]
pub enum TaskError {
    /// Input or output did not match its schema. Never retried.
    #[error("Task {stage} validation failed after {attempts} attempt(s): {source}")]
    Validation {
        stage: ValidationStage,
        attempts: usize,
        #[source]
        source: ValidationError,
    },

    /// The last attempt exceeded the configured timeout
    #[error("Task timed out after {timeout:?} ({attempts} attempt(s))")]
    Timeout { timeout: Duration, attempts: usize },

    /// The operation itself failed on its last attempt
    #[error("Task operation failed after {attempts} attempt(s): {source}")]
    Operation {
        attempts: usize,
        #[source]
        source: BoxError,
    },

    /// Span setup failed before the operation ran
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl TaskError {
    /// Get the canonical error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "E_VALIDATION",
            Self::Timeout { .. } => "E_TIMEOUT",
            Self::Operation { .. } => "E_OPERATION",
            Self::Telemetry(_) => "E_TELEMETRY",
        }
    }

    /// Number of operation attempts made before the error was returned
    pub fn attempts(&self) -> usize {
        match self {
            Self::Validation { attempts, .. }
            | Self::Timeout { attempts, .. }
            | Self::Operation { attempts, .. } => *attempts,
            Self::Telemetry(_) => 0,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Timeout { .. } => "TimeoutError",
            Self::Operation { .. } => "OperationError",
            Self::Telemetry(_) => "TelemetryError",
        }
    }
}

impl RecordableError for TaskError {
    fn exception(&self) -> Option<ExceptionInfo> {
        Some(ExceptionInfo::from_error(self.kind_name(), self))
    }
}

/// Failure of one attempt
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation failed: {0}")]
    Operation(#[source] BoxError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl AttemptFailure {
    /// Turn the last attempt's failure into the call's terminal error
    pub fn into_task_error(self, attempts: usize) -> TaskError {
        match self {
            Self::Timeout(timeout) => TaskError::Timeout { timeout, attempts },
            Self::Operation(source) => TaskError::Operation { attempts, source },
            Self::Telemetry(err) => TaskError::Telemetry(err),
        }
    }
}

impl RecordableError for AttemptFailure {
    fn exception(&self) -> Option<ExceptionInfo> {
        match self {
            Self::Timeout(_) => Some(ExceptionInfo::new("TimeoutError", self.to_string())),
            Self::Operation(source) => source.exception(),
            Self::Telemetry(err) => err.exception(),
        }
    }
}

/// Result type for task calls
pub type Result<T> = std::result::Result<T, TaskError>;
