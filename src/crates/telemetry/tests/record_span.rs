//! Span lifecycle tests for `TelemetryRecorder::record_span`

use agentic_telemetry::{
    AgenticSpanAttributes, AttributeValue, ExceptionInfo, InMemoryTracer, RecordSpanOptions,
    RecordableError, SpanKind, SpanStatus, TelemetryError, TelemetryOptions, TelemetryRecorder,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Operation error used across these tests
#[derive(Debug, PartialEq)]
enum OpError {
    Remote(String),
    Opaque,
    Telemetry(String),
}

impl From<TelemetryError> for OpError {
    fn from(err: TelemetryError) -> Self {
        OpError::Telemetry(err.to_string())
    }
}

impl RecordableError for OpError {
    fn exception(&self) -> Option<ExceptionInfo> {
        match self {
            OpError::Remote(message) => Some(ExceptionInfo::new("RemoteError", message.clone())),
            OpError::Telemetry(message) => {
                Some(ExceptionInfo::new("TelemetryError", message.clone()))
            }
            OpError::Opaque => None,
        }
    }
}

fn setup() -> (Arc<InMemoryTracer>, TelemetryRecorder) {
    let tracer = Arc::new(InMemoryTracer::new());
    let recorder = TelemetryRecorder::new(TelemetryOptions::default().with_tracer(tracer.clone()));
    (tracer, recorder)
}

#[tokio::test]
async fn test_success_ends_span_once_and_returns_value() {
    let (tracer, recorder) = setup();

    let result = recorder
        .record_span(
            RecordSpanOptions::new("search").with_kind(SpanKind::Client),
            |_span| async { Ok::<_, OpError>("ok") },
        )
        .await;

    assert_eq!(result, Ok("ok"));
    let spans = tracer.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, "search");
    assert_eq!(spans[0].kind, SpanKind::Client);
    assert_eq!(spans[0].end_count, 1);
    assert_eq!(spans[0].status, SpanStatus::Unset);
}

#[tokio::test]
async fn test_failure_records_exception_and_returns_same_error() {
    let (tracer, recorder) = setup();

    let result: Result<(), OpError> = recorder
        .record_span(RecordSpanOptions::new("search"), |_span| async {
            Err(OpError::Remote("503 service unavailable".to_string()))
        })
        .await;

    assert_eq!(result, Err(OpError::Remote("503 service unavailable".to_string())));
    let span = &tracer.spans()[0];
    assert_eq!(span.end_count, 1);
    assert_eq!(span.status, SpanStatus::error("503 service unavailable"));
    assert_eq!(span.exceptions.len(), 1);
    assert_eq!(span.exceptions[0].name, "RemoteError");
}

#[tokio::test]
async fn test_opaque_failure_sets_error_status_without_exception() {
    let (tracer, recorder) = setup();

    let result: Result<(), OpError> = recorder
        .record_span(RecordSpanOptions::new("opaque"), |_span| async { Err(OpError::Opaque) })
        .await;

    assert_eq!(result, Err(OpError::Opaque));
    let span = &tracer.spans()[0];
    assert_eq!(span.status, SpanStatus::Error { message: None });
    assert!(span.exceptions.is_empty());
    assert_eq!(span.end_count, 1);
}

#[tokio::test]
async fn test_end_when_done_false_leaves_span_open() {
    let (tracer, recorder) = setup();

    let span = recorder
        .record_span(
            RecordSpanOptions::new("stream").with_end_when_done(false),
            |span| async move { Ok::<_, OpError>(span) },
        )
        .await
        .unwrap();

    assert!(tracer.finished_spans().is_empty());
    span.set_attribute("stream.chunks", 12);
    assert!(span.end());

    let data = &tracer.spans()[0];
    assert_eq!(data.end_count, 1);
    assert_eq!(data.attribute("stream.chunks"), Some(&AttributeValue::Int(12)));
}

#[tokio::test]
async fn test_end_when_done_false_still_ends_on_failure() {
    let (tracer, recorder) = setup();

    let _ = recorder
        .record_span(
            RecordSpanOptions::new("stream").with_end_when_done(false),
            |_span| async { Err::<(), _>(OpError::Remote("reset".to_string())) },
        )
        .await;

    assert_eq!(tracer.finished_spans().len(), 1);
}

#[tokio::test]
async fn test_operation_ending_span_early_is_not_double_ended() {
    let (tracer, recorder) = setup();

    let _ = recorder
        .record_span(RecordSpanOptions::new("early"), |span| async move {
            span.end();
            Err::<(), _>(OpError::Remote("late failure".to_string()))
        })
        .await;

    assert_eq!(tracer.spans()[0].end_count, 1);
}

#[tokio::test]
async fn test_producer_failure_starts_no_span_and_skips_operation() {
    let (tracer, recorder) = setup();
    let invoked = Arc::new(AtomicBool::new(false));
    let flag = invoked.clone();

    let result: Result<(), OpError> = recorder
        .record_span(
            RecordSpanOptions::new("broken").with_attributes(
                AgenticSpanAttributes::new().try_input("input", || Err("cyclic value".into())),
            ),
            |_span| async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

    assert!(matches!(result, Err(OpError::Telemetry(ref m)) if m.contains("cyclic value")));
    assert!(!invoked.load(Ordering::SeqCst));
    assert!(tracer.spans().is_empty());
}

#[tokio::test]
async fn test_operation_can_add_events() {
    let (tracer, recorder) = setup();

    recorder
        .record_span(RecordSpanOptions::new("agent"), |span| async move {
            span.add_event("tool.selected", Default::default());
            Ok::<_, OpError>(())
        })
        .await
        .unwrap();

    assert_eq!(tracer.spans()[0].events_named("tool.selected").count(), 1);
}

#[tokio::test]
async fn test_disabled_recorder_still_runs_operation() {
    let tracer = Arc::new(InMemoryTracer::new());
    let recorder = TelemetryRecorder::new(
        TelemetryOptions::default()
            .with_tracer(tracer.clone())
            .with_enabled(false),
    );

    let result = recorder
        .record_span(RecordSpanOptions::new("quiet"), |span| async move {
            assert!(!span.is_recording());
            Ok::<_, OpError>(7)
        })
        .await;

    assert_eq!(result, Ok(7));
    assert!(tracer.spans().is_empty());
}

#[tokio::test]
async fn test_anyhow_errors_are_recorded_with_cause_chain() {
    let (tracer, recorder) = setup();

    let result: anyhow::Result<()> = recorder
        .record_span(RecordSpanOptions::new("io"), |_span| async {
            let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
            Err(anyhow::Error::new(io).context("fetch failed"))
        })
        .await;

    assert!(result.is_err());
    let exception = &tracer.spans()[0].exceptions[0];
    assert_eq!(exception.message, "fetch failed");
    assert!(exception.stacktrace.as_deref().unwrap_or_default().contains("peer reset"));
}
