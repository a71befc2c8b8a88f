//! Task executor
//!
//! [`TaskExecutor`] owns a [`Task`] plus the call policy around it: an
//! optional per-attempt timeout, an optional retry strategy and an optional
//! telemetry recorder. One call moves through
//!
//! ```text
//! Pending -> Validating -> Executing -> (Retrying -> Executing)* -> Succeeded | Failed
//! ```
//!
//! Input validation failures never reach the operation. Output validation
//! runs once, on the raw output of the successful attempt, and is never
//! retried.
//!
//! With a recorder attached the whole call runs in a `task.call` span and
//! each attempt in a nested `task.attempt` span.

use crate::config::TaskConfig;
use crate::error::{AttemptFailure, Result, TaskError, ValidationStage};
use crate::retry::{RetryDecision, RetryState, RetryStrategy};
use crate::schema::{ValidationError, ValidationIssue};
use crate::task::{AttemptContext, Task};
use crate::timeout::{with_timeout, TimeoutError};
use agentic_common::error::root_cause;
use agentic_common::logging::format_duration;
use agentic_telemetry::{
    AgenticSpanAttributes, AttributeValue, Attributes, RecordSpanOptions, SpanHandle,
    TelemetryRecorder,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where a call currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Pending,
    Validating,
    Executing { attempt: usize },
    Retrying { attempt: usize, delay: Duration },
    Succeeded,
    Failed,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Validating => f.write_str("validating"),
            Self::Executing { attempt } => write!(f, "executing (attempt {})", attempt),
            Self::Retrying { attempt, delay } => {
                write!(f, "retrying after attempt {} in {}", attempt, format_duration(*delay))
            }
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// How one attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    TimedOut,
    Failed { error: String },
}

/// Record of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt: usize,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    fn new(
        attempt: usize,
        elapsed: Duration,
        result: &std::result::Result<Value, AttemptFailure>,
    ) -> Self {
        let outcome = match result {
            Ok(_) => AttemptOutcome::Succeeded,
            Err(AttemptFailure::Timeout(_)) => AttemptOutcome::TimedOut,
            Err(failure) => AttemptOutcome::Failed {
                error: failure.to_string(),
            },
        };

        Self {
            attempt,
            elapsed,
            outcome,
        }
    }
}

/// Validated output plus the attempts it took
#[derive(Debug, Clone)]
pub struct TaskOutput<O> {
    pub output: O,
    pub attempts: Vec<AttemptRecord>,
}

impl<O> TaskOutput<O> {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    pub fn into_inner(self) -> O {
        self.output
    }
}

/// The call span and the recorder that owns it
struct CallSpan<'a> {
    recorder: &'a TelemetryRecorder,
    span: SpanHandle,
}

/// Runs a [`Task`] with validation, timeout, retry and telemetry
pub struct TaskExecutor<T> {
    task: T,
    timeout: Option<Duration>,
    retry: Option<Arc<dyn RetryStrategy>>,
    telemetry: Option<TelemetryRecorder>,
}

impl<T: Task> TaskExecutor<T> {
    /// One attempt, no timeout, no telemetry
    pub fn new(task: T) -> Self {
        Self {
            task,
            timeout: None,
            retry: None,
            telemetry: None,
        }
    }

    /// Bound every attempt by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, strategy: impl RetryStrategy + 'static) -> Self {
        self.retry = Some(Arc::new(strategy));
        self
    }

    pub fn with_telemetry(mut self, recorder: TelemetryRecorder) -> Self {
        self.telemetry = Some(recorder);
        self
    }

    /// Apply timeout and retry settings from configuration
    pub fn with_config(mut self, config: &TaskConfig) -> Self {
        self.timeout = config.timeout;
        self.retry = Some(Arc::new(config.retry_policy()));
        self
    }

    /// Replace the retry strategy in place
    ///
    /// Calls already in flight keep the strategy they started with.
    pub fn retry_config(&mut self, strategy: impl RetryStrategy + 'static) -> &mut Self {
        self.retry = Some(Arc::new(strategy));
        self
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn retry(&self) -> Option<&Arc<dyn RetryStrategy>> {
        self.retry.as_ref()
    }

    pub fn telemetry(&self) -> Option<&TelemetryRecorder> {
        self.telemetry.as_ref()
    }

    /// Validate `raw`, run the task and return the validated output
    pub async fn call(&self, raw: Value) -> Result<T::Output> {
        self.invoke(raw).await.map(TaskOutput::into_inner)
    }

    /// Like [`Self::call`], serializing `input` first
    pub async fn call_with<I: Serialize>(&self, input: I) -> Result<T::Output> {
        let raw = serde_json::to_value(input).map_err(|e| TaskError::Validation {
            stage: ValidationStage::Input,
            attempts: 0,
            source: ValidationError::single(ValidationIssue::root(e.to_string())),
        })?;
        self.call(raw).await
    }

    /// Like [`Self::call`], also returning the record of every attempt
    pub async fn invoke(&self, raw: Value) -> Result<TaskOutput<T::Output>> {
        // Later retry_config calls must not affect this call
        let retry = self.retry.clone();

        let Some(recorder) = &self.telemetry else {
            return self.run(&raw, retry.as_deref(), None).await;
        };

        let raw = Arc::new(raw);
        let input = raw.clone();
        let attributes = AgenticSpanAttributes::new()
            .literal("task.name", self.task.name())
            .input("task.input", move || Some(AttributeValue::String(input.to_string())))
            .literal("task.max_attempts", max_attempts(retry.as_deref()))
            .optional("task.timeout_ms", self.timeout.map(millis));

        recorder
            .record_span(
                RecordSpanOptions::new("task.call").with_attributes(attributes),
                move |span| async move {
                    let call = CallSpan { recorder, span };
                    self.run(&raw, retry.as_deref(), Some(&call)).await
                },
            )
            .await
    }

    async fn run(
        &self,
        raw: &Value,
        retry: Option<&dyn RetryStrategy>,
        call: Option<&CallSpan<'_>>,
    ) -> Result<TaskOutput<T::Output>> {
        let name = self.task.name();
        let mut state = CallState::Pending;

        self.transition(&mut state, CallState::Validating);
        let input = match self.task.input_schema().parse(raw) {
            Ok(input) => input,
            Err(source) => {
                self.transition(&mut state, CallState::Failed);
                warn!(task = %name, error = %source, "task input rejected");
                return Err(TaskError::Validation {
                    stage: ValidationStage::Input,
                    attempts: 0,
                    source,
                });
            }
        };

        let max_attempts = max_attempts(retry);
        let mut retry_state = RetryState::new();
        let mut records = Vec::with_capacity(max_attempts);

        let raw_output = loop {
            let attempt = retry_state.attempts + 1;
            self.transition(&mut state, CallState::Executing { attempt });

            let started = Instant::now();
            let result = self.attempt(&input, attempt, max_attempts, call).await;
            records.push(AttemptRecord::new(attempt, started.elapsed(), &result));

            let failure = match result {
                Ok(value) => {
                    retry_state.record_attempt(None);
                    break value;
                }
                Err(failure) => failure,
            };
            retry_state.record_attempt(Some(failure.to_string()));

            let decision = match retry {
                Some(strategy) if attempt < max_attempts => strategy.decide(&failure, attempt),
                _ => RetryDecision::Stop,
            };

            match decision {
                RetryDecision::Retry { delay } => {
                    let delay = retry_state.next_delay(delay);
                    self.transition(&mut state, CallState::Retrying { attempt, delay });
                    warn!(
                        task = %name,
                        attempt,
                        max_attempts,
                        delay = %format_duration(delay),
                        error = %failure,
                        "task attempt failed, retrying"
                    );

                    if let Some(call) = call {
                        call.span.add_event("task.retry", retry_event(attempt, delay, &failure));
                    }
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Stop => {
                    self.transition(&mut state, CallState::Failed);
                    warn!(
                        task = %name,
                        attempts = attempt,
                        error = %failure,
                        cause = %root_cause(&failure),
                        "task failed"
                    );

                    if let Some(call) = call {
                        call.span.set_attribute("task.attempts", attempt);
                    }
                    return Err(failure.into_task_error(attempt));
                }
            }
        };

        let attempts = retry_state.attempts;
        let raw_output = Arc::new(raw_output);

        if let Some(call) = call {
            call.span.set_attribute("task.attempts", attempts);
            let output = raw_output.clone();
            call.recorder.record_attributes(
                &call.span,
                AgenticSpanAttributes::new().output("task.output", move || {
                    Some(AttributeValue::String(output.to_string()))
                }),
            )?;
        }

        let output = match self.task.output_schema().parse(&raw_output) {
            Ok(output) => output,
            Err(source) => {
                self.transition(&mut state, CallState::Failed);
                warn!(task = %name, attempts, error = %source, "task output rejected");
                return Err(TaskError::Validation {
                    stage: ValidationStage::Output,
                    attempts,
                    source,
                });
            }
        };

        self.transition(&mut state, CallState::Succeeded);
        info!(task = %name, attempts, "task succeeded");

        Ok(TaskOutput {
            output,
            attempts: records,
        })
    }

    /// Run one attempt, inside a `task.attempt` span when recording
    async fn attempt(
        &self,
        input: &T::Input,
        attempt: usize,
        max_attempts: usize,
        call: Option<&CallSpan<'_>>,
    ) -> std::result::Result<Value, AttemptFailure> {
        let ctx = AttemptContext::new(attempt, max_attempts, self.timeout);

        let Some(call) = call else {
            return self.execute_once(input, ctx).await;
        };

        let attributes = AgenticSpanAttributes::new()
            .literal("task.name", self.task.name())
            .literal("task.attempt.number", attempt);

        call.recorder
            .record_span(
                RecordSpanOptions::new("task.attempt").with_attributes(attributes),
                |span| self.execute_once(input, ctx.with_span(span)),
            )
            .await
    }

    async fn execute_once(
        &self,
        input: &T::Input,
        ctx: AttemptContext,
    ) -> std::result::Result<Value, AttemptFailure> {
        with_timeout(self.timeout, self.task.execute(input, &ctx))
            .await
            .map_err(|e| match e {
                TimeoutError::Elapsed(limit) => AttemptFailure::Timeout(limit),
                TimeoutError::Failed(source) => AttemptFailure::Operation(source),
            })
    }

    fn transition(&self, state: &mut CallState, next: CallState) {
        debug!(task = %self.task.name(), from = %state, to = %next, "task state transition");
        *state = next;
    }
}

impl<T: Task + fmt::Debug> fmt::Debug for TaskExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("task", &self.task)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

fn max_attempts(retry: Option<&dyn RetryStrategy>) -> usize {
    retry.map_or(1, |strategy| strategy.max_attempts().max(1))
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn retry_event(attempt: usize, delay: Duration, failure: &AttemptFailure) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert("task.attempt.number".to_string(), attempt.into());
    attributes.insert("task.retry.delay_ms".to_string(), millis(delay).into());
    attributes.insert("task.retry.reason".to_string(), failure.to_string().into());
    attributes
}
