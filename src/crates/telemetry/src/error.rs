//! Error types for span recording

use agentic_common::error::{error_chain_length, format_error_chain, BoxError};
use std::error::Error as StdError;
use thiserror::Error;

/// Errors raised by the telemetry layer itself
///
/// These are defects in caller-supplied telemetry code or in process setup,
/// never failures of the operation being traced.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A deferred input/output attribute producer failed
    #[error("Attribute producer for '{key}' failed: {source}")]
    AttributeProducer {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The process-wide default tracer was already initialised
    #[error("Global tracer already initialised")]
    TracerAlreadySet,
}

impl TelemetryError {
    /// Get the canonical error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AttributeProducer { .. } => "E_TELEMETRY_ATTRIBUTE",
            Self::TracerAlreadySet => "E_TELEMETRY_TRACER_SET",
        }
    }
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Exception details attached to a span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    /// Error kind or type name
    pub name: String,
    /// Display message of the error
    pub message: String,
    /// Formatted `source()` chain, when the error has causes
    pub stacktrace: Option<String>,
}

impl ExceptionInfo {
    /// Create exception info without a stack trace
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stacktrace: None,
        }
    }

    /// Build exception info from an error and its cause chain
    pub fn from_error(name: impl Into<String>, error: &(dyn StdError + 'static)) -> Self {
        let stacktrace = (error_chain_length(error) > 1).then(|| format_error_chain(error));
        Self {
            name: name.into(),
            message: error.to_string(),
            stacktrace,
        }
    }
}

/// Explicit error-kind discriminant used when a traced operation fails
///
/// `Some` marks an error value whose details belong on the span as an
/// exception; `None` marks an opaque failure that only flips the span status.
pub trait RecordableError {
    fn exception(&self) -> Option<ExceptionInfo>;
}

impl RecordableError for TelemetryError {
    fn exception(&self) -> Option<ExceptionInfo> {
        Some(ExceptionInfo::from_error("TelemetryError", self))
    }
}

impl RecordableError for anyhow::Error {
    fn exception(&self) -> Option<ExceptionInfo> {
        let error: &(dyn StdError + 'static) = &**self;
        Some(ExceptionInfo::from_error("Error", error))
    }
}

impl RecordableError for BoxError {
    fn exception(&self) -> Option<ExceptionInfo> {
        let error: &(dyn StdError + 'static) = &**self;
        Some(ExceptionInfo::from_error("Error", error))
    }
}

impl RecordableError for std::io::Error {
    fn exception(&self) -> Option<ExceptionInfo> {
        Some(ExceptionInfo::from_error(format!("IoError({:?})", self.kind()), self))
    }
}

impl RecordableError for String {
    fn exception(&self) -> Option<ExceptionInfo> {
        None
    }
}

impl RecordableError for &'static str {
    fn exception(&self) -> Option<ExceptionInfo> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TelemetryError::TracerAlreadySet.error_code(), "E_TELEMETRY_TRACER_SET");

        let err = TelemetryError::AttributeProducer {
            key: "input".to_string(),
            source: "serialization failed".into(),
        };
        assert_eq!(err.error_code(), "E_TELEMETRY_ATTRIBUTE");
        assert_eq!(
            err.to_string(),
            "Attribute producer for 'input' failed: serialization failed"
        );
    }

    #[test]
    fn test_exception_from_error_with_cause() {
        let err = TelemetryError::AttributeProducer {
            key: "prompt".to_string(),
            source: "bad utf-8".into(),
        };
        let info = err.exception().unwrap();

        assert_eq!(info.name, "TelemetryError");
        assert!(info.message.contains("prompt"));
        let stack = info.stacktrace.unwrap();
        assert!(stack.contains("Caused by: bad utf-8"));
    }

    #[test]
    fn test_exception_without_cause_has_no_stacktrace() {
        let err = anyhow::anyhow!("rate limited");
        let info = err.exception().unwrap();

        assert_eq!(info.message, "rate limited");
        assert!(info.stacktrace.is_none());
    }

    #[test]
    fn test_opaque_failures_have_no_exception() {
        assert!("plain failure".exception().is_none());
        assert!(String::from("plain failure").exception().is_none());
    }
}
