//! The task contract
//!
//! A [`Task`] declares its schemas and one async operation. Everything else
//! (validation, timeout, retry, spans) is the executor's job, so an
//! implementation only has to describe what a single attempt does.

use crate::schema::Schema;
use agentic_common::error::BoxError;
use agentic_telemetry::SpanHandle;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Per-attempt information handed to [`Task::execute`]
#[derive(Debug, Clone)]
pub struct AttemptContext {
    /// 1-based attempt number
    pub attempt: usize,
    pub max_attempts: usize,
    /// Timeout applied to this attempt, if any
    pub timeout: Option<Duration>,
    span: Option<SpanHandle>,
}

impl AttemptContext {
    pub fn new(attempt: usize, max_attempts: usize, timeout: Option<Duration>) -> Self {
        Self {
            attempt,
            max_attempts,
            timeout,
            span: None,
        }
    }

    pub(crate) fn with_span(mut self, span: SpanHandle) -> Self {
        self.span = Some(span);
        self
    }

    /// The `task.attempt` span, when the executor records telemetry
    pub fn span(&self) -> Option<&SpanHandle> {
        self.span.as_ref()
    }

    pub fn is_last_attempt(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// A schema-guarded async operation
///
/// `execute` returns raw JSON; the executor validates it against
/// `output_schema` after the final successful attempt.
#[async_trait]
pub trait Task: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    /// Name used for spans and log lines
    fn name(&self) -> &str;

    fn input_schema(&self) -> &dyn Schema<Parsed = Self::Input>;

    fn output_schema(&self) -> &dyn Schema<Parsed = Self::Output>;

    /// Perform one attempt
    async fn execute(&self, input: &Self::Input, ctx: &AttemptContext) -> Result<Value, BoxError>;
}

/// Task built from two schemas and an async closure
///
/// The closure receives a clone of the parsed input for every attempt.
///
/// ```rust
/// use agentic_task::schema::AnySchema;
/// use agentic_task::{BoxError, FnTask};
/// use serde_json::json;
///
/// let echo = FnTask::new("echo", AnySchema, AnySchema, |input, _ctx| async move {
///     Ok::<_, BoxError>(json!({ "echo": input }))
/// });
/// # let _ = echo;
/// ```
pub struct FnTask<I, O, F> {
    name: String,
    input_schema: Box<dyn Schema<Parsed = I>>,
    output_schema: Box<dyn Schema<Parsed = O>>,
    operation: F,
}

impl<I, O, F> FnTask<I, O, F> {
    pub fn new<Fut>(
        name: impl Into<String>,
        input_schema: impl Schema<Parsed = I> + 'static,
        output_schema: impl Schema<Parsed = O> + 'static,
        operation: F,
    ) -> Self
    where
        F: Fn(I, AttemptContext) -> Fut,
        Fut: Future<Output = Result<Value, BoxError>>,
    {
        Self {
            name: name.into(),
            input_schema: Box::new(input_schema),
            output_schema: Box::new(output_schema),
            operation,
        }
    }
}

impl<I, O, F> fmt::Debug for FnTask<I, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<I, O, F, Fut> Task for FnTask<I, O, F>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
    F: Fn(I, AttemptContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, BoxError>> + Send,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> &str {
        &self.name
    }

    fn input_schema(&self) -> &dyn Schema<Parsed = I> {
        self.input_schema.as_ref()
    }

    fn output_schema(&self) -> &dyn Schema<Parsed = O> {
        self.output_schema.as_ref()
    }

    async fn execute(&self, input: &I, ctx: &AttemptContext) -> Result<Value, BoxError> {
        (self.operation)(input.clone(), ctx.clone()).await
    }
}
