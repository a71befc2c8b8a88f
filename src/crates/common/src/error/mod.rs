//! Error chain utilities
//!
//! Helpers for walking `std::error::Error::source()` chains. The telemetry
//! crate uses them to turn an error into the stack-trace field of a span
//! exception.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentic_common::error::{format_error_chain, root_cause};
//!
//! if let Err(e) = executor.call(input).await {
//!     tracing::error!("task failed:\n{}", format_error_chain(&e));
//!     tracing::error!("root cause: {}", root_cause(&e));
//! }
//! ```

mod chain;

pub use chain::{error_chain_length, format_error_chain, root_cause, BoxError};
