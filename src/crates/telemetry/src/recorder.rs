//! Telemetry recorder
//!
//! [`TelemetryRecorder::record_span`] wraps one async operation in one span:
//! attributes are converted under the recorder's redaction policy, the span is
//! started, the operation runs with the span as its `tracing` context, and the
//! span is ended on every exit path.
//!
//! # Example
//!
//! ```rust
//! use agentic_telemetry::{
//!     AgenticSpanAttributes, InMemoryTracer, RecordSpanOptions, TelemetryError,
//!     TelemetryOptions, TelemetryRecorder,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), TelemetryError> {
//! let tracer = Arc::new(InMemoryTracer::new());
//! let recorder = TelemetryRecorder::new(
//!     TelemetryOptions::default()
//!         .with_tracer(tracer.clone())
//!         .with_record_inputs(false),
//! );
//!
//! let answer = recorder
//!     .record_span(
//!         RecordSpanOptions::new("llm.call").with_attributes(
//!             AgenticSpanAttributes::new()
//!                 .literal("llm.model", "gpt-4o")
//!                 .input("llm.prompt", || Some("secret prompt".into())),
//!         ),
//!         |_span| async { Ok::<_, TelemetryError>(42) },
//!     )
//!     .await?;
//!
//! assert_eq!(answer, 42);
//! assert!(tracer.spans()[0].attribute("llm.prompt").is_none());
//! # Ok(())
//! # }
//! ```

use crate::attributes::{
    AgenticSpanAttributes, AttributeProducer, AttributeValue, Attributes, SpanAttribute,
    METADATA_PREFIX,
};
use crate::config::TelemetryConfig;
use crate::error::{RecordableError, Result, TelemetryError};
use crate::global;
use crate::noop::NoopTracer;
use crate::tracer::{SpanHandle, SpanKind, SpanOptions, SpanStatus, Tracer};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;

/// Status message set on spans whose operation never completed
pub const DROPPED_SPAN_MESSAGE: &str = "span dropped before the operation completed";

/// Options for [`TelemetryRecorder::new`]
#[derive(Clone)]
pub struct TelemetryOptions {
    /// Tracer to record with; `None` uses [`global::tracer`]
    pub tracer: Option<Arc<dyn Tracer>>,
    pub is_enabled: bool,
    pub record_inputs: bool,
    pub record_outputs: bool,
    /// Static attributes added to every span under [`METADATA_PREFIX`]
    pub metadata: Attributes,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            tracer: None,
            is_enabled: true,
            record_inputs: true,
            record_outputs: true,
            metadata: Attributes::new(),
        }
    }
}

impl TelemetryOptions {
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }

    pub fn with_record_inputs(mut self, record: bool) -> Self {
        self.record_inputs = record;
        self
    }

    pub fn with_record_outputs(mut self, record: bool) -> Self {
        self.record_outputs = record;
        self
    }

    /// Add one metadata entry
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for TelemetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryOptions")
            .field("tracer", &self.tracer.as_ref().map(|_| "<tracer>"))
            .field("is_enabled", &self.is_enabled)
            .field("record_inputs", &self.record_inputs)
            .field("record_outputs", &self.record_outputs)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Options for a single [`TelemetryRecorder::record_span`] call
#[derive(Debug)]
pub struct RecordSpanOptions {
    pub name: String,
    pub kind: SpanKind,
    /// End the span when the operation succeeds. Failures always end it.
    pub end_when_done: bool,
    pub attributes: AgenticSpanAttributes,
}

impl RecordSpanOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SpanKind::Internal,
            end_when_done: true,
            attributes: AgenticSpanAttributes::new(),
        }
    }

    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_end_when_done(mut self, end_when_done: bool) -> Self {
        self.end_when_done = end_when_done;
        self
    }

    pub fn with_attributes(mut self, attributes: AgenticSpanAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Records spans around async operations
///
/// Read-only after construction; clone it or share it behind an `Arc`.
#[derive(Clone)]
pub struct TelemetryRecorder {
    tracer: Arc<dyn Tracer>,
    is_enabled: bool,
    record_inputs: bool,
    record_outputs: bool,
    metadata: Arc<Attributes>,
}

impl TelemetryRecorder {
    /// Create a recorder
    ///
    /// A disabled recorder always uses [`NoopTracer`], even when a tracer is
    /// supplied.
    pub fn new(options: TelemetryOptions) -> Self {
        let tracer = match (options.is_enabled, options.tracer) {
            (false, _) => Arc::new(NoopTracer) as Arc<dyn Tracer>,
            (true, Some(tracer)) => tracer,
            (true, None) => global::tracer(),
        };

        Self {
            tracer,
            is_enabled: options.is_enabled,
            record_inputs: options.record_inputs,
            record_outputs: options.record_outputs,
            metadata: Arc::new(options.metadata),
        }
    }

    /// Create a recorder from loaded configuration
    pub fn from_config(config: &TelemetryConfig, tracer: Option<Arc<dyn Tracer>>) -> Self {
        Self::new(TelemetryOptions {
            tracer,
            is_enabled: config.enabled,
            record_inputs: config.record_inputs,
            record_outputs: config.record_outputs,
            metadata: config.metadata.clone(),
        })
    }

    /// A recorder that records nothing
    pub fn disabled() -> Self {
        Self::new(TelemetryOptions::default().with_enabled(false))
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn record_inputs(&self) -> bool {
        self.record_inputs
    }

    pub fn record_outputs(&self) -> bool {
        self.record_outputs
    }

    pub fn metadata(&self) -> &Attributes {
        &self.metadata
    }

    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    /// Run `operation` inside a new span
    ///
    /// The operation receives the span handle. On success the span is ended
    /// when `end_when_done` is set and the value is returned unchanged. On
    /// failure the error is recorded on the span (exception details when
    /// [`RecordableError::exception`] provides them, error status always), the
    /// span is ended and the same error is returned. If the returned future is
    /// dropped before completing, the span is ended with an error status.
    ///
    /// A failing attribute producer fails the call with
    /// [`TelemetryError::AttributeProducer`] before any span is started.
    pub async fn record_span<T, E, F, Fut>(
        &self,
        options: RecordSpanOptions,
        operation: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(SpanHandle) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<TelemetryError> + RecordableError,
    {
        let RecordSpanOptions {
            name,
            kind,
            end_when_done,
            attributes,
        } = options;

        let attributes = self.convert_attributes(attributes).map_err(E::from)?;
        let span = self.start_span(&name, kind, attributes);
        let mut guard = EndOnDrop::new(span.clone());

        let result = operation(span.clone()).instrument(span.context()).await;
        guard.disarm();

        match &result {
            Ok(_) => {
                if end_when_done {
                    span.end();
                }
            }
            Err(error) => {
                if span.is_ended() {
                    tracing::debug!(
                        span = %name,
                        exception = ?error.exception(),
                        "operation failed after ending its span, error not recorded"
                    );
                } else {
                    record_error(&span, error);
                    span.end();
                }
            }
        }

        result
    }

    /// Start a span without running anything in it
    pub fn start_span(&self, name: &str, kind: SpanKind, attributes: Attributes) -> SpanHandle {
        SpanHandle::new(self.tracer.start_span(name, SpanOptions { kind, attributes }))
    }

    /// Resolve declared attributes into the flat set recorded on a span
    ///
    /// Unset entries are dropped. Input producers run only when inputs are
    /// recorded and output producers only when outputs are recorded; a
    /// producer returning `None` drops its key. Metadata is then added under
    /// [`METADATA_PREFIX`].
    pub fn convert_attributes(&self, attributes: AgenticSpanAttributes) -> Result<Attributes> {
        let mut converted = self.resolve(attributes)?;
        for (key, value) in self.metadata.iter() {
            converted.insert(format!("{}{}", METADATA_PREFIX, key), value.clone());
        }
        Ok(converted)
    }

    /// Set attributes known only after the span started
    ///
    /// Applies the same redaction policy as [`Self::convert_attributes`] but
    /// does not add metadata again.
    pub fn record_attributes(
        &self,
        span: &SpanHandle,
        attributes: AgenticSpanAttributes,
    ) -> Result<()> {
        let resolved = self.resolve(attributes)?;
        span.set_attributes(resolved);
        Ok(())
    }

    fn resolve(&self, attributes: AgenticSpanAttributes) -> Result<Attributes> {
        let mut resolved = Attributes::with_capacity(attributes.len());

        for (key, attribute) in attributes {
            let value = match attribute {
                SpanAttribute::Literal(value) => Some(value),
                SpanAttribute::Unset => None,
                SpanAttribute::Input(producer) if self.record_inputs => produce(&key, producer)?,
                SpanAttribute::Output(producer) if self.record_outputs => produce(&key, producer)?,
                SpanAttribute::Input(_) | SpanAttribute::Output(_) => None,
            };

            if let Some(value) = value {
                resolved.insert(key, value);
            }
        }

        Ok(resolved)
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new(TelemetryOptions::default())
    }
}

impl fmt::Debug for TelemetryRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryRecorder")
            .field("is_enabled", &self.is_enabled)
            .field("record_inputs", &self.record_inputs)
            .field("record_outputs", &self.record_outputs)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

fn produce(key: &str, producer: AttributeProducer) -> Result<Option<AttributeValue>> {
    producer().map_err(|source| TelemetryError::AttributeProducer {
        key: key.to_string(),
        source,
    })
}

/// Record a failed outcome on `span`
pub fn record_error<E: RecordableError + ?Sized>(span: &SpanHandle, error: &E) {
    match error.exception() {
        Some(exception) => {
            span.record_exception(&exception);
            span.set_status(SpanStatus::error(exception.message));
        }
        None => span.set_status(SpanStatus::Error { message: None }),
    }
}

/// Ends the span with an error status if the operation never completed
struct EndOnDrop {
    span: Option<SpanHandle>,
}

impl EndOnDrop {
    fn new(span: SpanHandle) -> Self {
        Self { span: Some(span) }
    }

    fn disarm(&mut self) {
        self.span = None;
    }
}

impl Drop for EndOnDrop {
    fn drop(&mut self) {
        if let Some(span) = self.span.take() {
            if !span.is_ended() {
                tracing::debug!("span dropped before the operation completed");
                span.set_status(SpanStatus::error(DROPPED_SPAN_MESSAGE));
                span.end();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryTracer;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn recorder_with(tracer: Arc<InMemoryTracer>) -> TelemetryRecorder {
        TelemetryRecorder::new(TelemetryOptions::default().with_tracer(tracer))
    }

    #[test]
    fn test_disabled_recorder_ignores_supplied_tracer() {
        let tracer = Arc::new(InMemoryTracer::new());
        let recorder = TelemetryRecorder::new(
            TelemetryOptions::default()
                .with_tracer(tracer.clone())
                .with_enabled(false),
        );

        let span = recorder.start_span("ignored", SpanKind::Internal, Attributes::new());
        span.end();

        assert!(!recorder.is_enabled());
        assert!(tracer.spans().is_empty());
    }

    #[test]
    fn test_convert_drops_unset_and_applies_metadata() {
        let recorder = TelemetryRecorder::new(
            TelemetryOptions::default()
                .with_tracer(Arc::new(InMemoryTracer::new()))
                .with_metadata("env", "test"),
        );

        let converted = recorder
            .convert_attributes(
                AgenticSpanAttributes::new()
                    .literal("env", "caller")
                    .optional::<i64>("missing", None)
                    .input("empty", || None),
            )
            .unwrap();

        assert_eq!(converted.len(), 2);
        assert_eq!(converted["env"], AttributeValue::from("caller"));
        assert_eq!(
            converted["agentic.telemetry.metadata.env"],
            AttributeValue::from("test")
        );
    }

    #[test]
    fn test_convert_skips_redacted_producers() {
        let recorder = TelemetryRecorder::new(
            TelemetryOptions::default()
                .with_tracer(Arc::new(InMemoryTracer::new()))
                .with_record_outputs(false),
        );
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();

        let converted = recorder
            .convert_attributes(AgenticSpanAttributes::new().output("out", move || {
                flag.store(true, Ordering::SeqCst);
                Some("value".into())
            }))
            .unwrap();

        assert!(converted.is_empty());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_producer_failure_is_reported_with_key() {
        let recorder = recorder_with(Arc::new(InMemoryTracer::new()));

        let err = recorder
            .convert_attributes(
                AgenticSpanAttributes::new()
                    .try_input("payload", || Err("not serializable".into())),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            TelemetryError::AttributeProducer { ref key, .. } if key == "payload"
        ));
    }

    #[test]
    fn test_record_attributes_has_no_metadata() {
        let tracer = Arc::new(InMemoryTracer::new());
        let recorder = TelemetryRecorder::new(
            TelemetryOptions::default()
                .with_tracer(tracer.clone())
                .with_metadata("env", "test"),
        );

        let span = recorder.start_span("late", SpanKind::Internal, Attributes::new());
        recorder
            .record_attributes(
                &span,
                AgenticSpanAttributes::new().output("result", || Some("ok".into())),
            )
            .unwrap();
        span.end();

        let data = &tracer.spans()[0];
        assert_eq!(data.attribute("result"), Some(&AttributeValue::from("ok")));
        assert!(data.attribute("agentic.telemetry.metadata.env").is_none());
    }

    #[tokio::test]
    async fn test_drop_guard_ends_cancelled_span() {
        let tracer = Arc::new(InMemoryTracer::new());
        let recorder = recorder_with(tracer.clone());

        let future = recorder.record_span(RecordSpanOptions::new("cancelled"), |_span| async {
            std::future::pending::<std::result::Result<(), TelemetryError>>().await
        });
        let result = tokio::time::timeout(std::time::Duration::from_millis(5), future).await;
        assert!(result.is_err());

        let data = &tracer.find("cancelled")[0];
        assert_eq!(data.end_count, 1);
        assert_eq!(data.status, SpanStatus::error(DROPPED_SPAN_MESSAGE));
    }
}
