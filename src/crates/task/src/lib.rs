//! Schema-validated task execution
//!
//! A [`Task`] is a declarative call boundary: an input schema, an output
//! schema and one async operation. [`TaskExecutor`] runs it with input
//! validation, a per-attempt timeout, retries under a [`RetryStrategy`] and,
//! when a [`TelemetryRecorder`](agentic_telemetry::TelemetryRecorder) is
//! attached, one span per call and per attempt.
//!
//! # Example
//!
//! ```rust
//! use agentic_task::schema::{AnySchema, FieldValidator, TypedSchema};
//! use agentic_task::{BoxError, FnTask, RetryPolicy, TaskExecutor};
//! use serde::Deserialize;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct Lookup {
//!     id: String,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let task = FnTask::new(
//!     "lookup",
//!     TypedSchema::<Lookup>::new().field("id", FieldValidator::new().string().not_empty()),
//!     AnySchema,
//!     |input: Lookup, _ctx| async move {
//!         Ok::<_, BoxError>(json!({ "id": input.id, "found": true }))
//!     },
//! );
//!
//! let executor = TaskExecutor::new(task)
//!     .with_timeout(Duration::from_secs(5))
//!     .with_retry(RetryPolicy::new(3));
//!
//! let output = executor.call(json!({ "id": "doc-1" })).await.unwrap();
//! assert_eq!(output["found"], true);
//!
//! let err = executor.call(json!({ "id": "" })).await.unwrap_err();
//! assert_eq!(err.error_code(), "E_VALIDATION");
//! # }
//! ```
//!
//! # Modules
//!
//! - `executor` - the executor, call states and attempt records
//! - `task` - the task trait and closure-backed tasks
//! - `schema` - schema trait and implementations
//! - `retry` - retry strategy and the exponential backoff policy
//! - `timeout` - timeout wrapper
//! - `config` - environment-driven executor configuration

pub mod config;
pub mod error;
pub mod executor;
pub mod retry;
pub mod schema;
pub mod task;
pub mod timeout;

pub use agentic_common::error::BoxError;
pub use config::TaskConfig;
pub use error::{AttemptFailure, Result, TaskError, ValidationStage};
pub use executor::{AttemptOutcome, AttemptRecord, CallState, TaskExecutor, TaskOutput};
pub use retry::{RetryDecision, RetryOn, RetryPolicy, RetryState, RetryStrategy};
pub use schema::{AnySchema, FnSchema, Schema, ValidationError, ValidationIssue};
pub use task::{AttemptContext, FnTask, Task};
