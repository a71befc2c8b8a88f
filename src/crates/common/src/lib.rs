//! Shared helpers for the agentic task runtime
//!
//! This crate holds the ambient pieces the telemetry and task crates lean on.
//!
//! # Modules
//!
//! - `config` - `ConfigBuilder` trait and environment variable loading
//! - `error` - Error chain formatting and root cause extraction
//! - `logging` - `tracing-subscriber` initialisation and duration formatting

pub mod config;
pub mod error;
pub mod logging;

use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum CommonError {
    /// A configuration value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An environment variable could not be read or parsed
    #[error("Environment variable {key}: {message}")]
    Env { key: String, message: String },
}

impl CommonError {
    /// Build a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Build an environment error for `key`
    pub fn env(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Env {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, CommonError>;
