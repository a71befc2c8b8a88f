//! What `TracingTracer` emits into a `tracing` subscriber
//!
//! A small capture layer stores every span with its fields (including later
//! `record` calls) and its parent, and every event with the span it belongs to.

use agentic_telemetry::{
    AgenticSpanAttributes, RecordSpanOptions, TelemetryError, TelemetryOptions, TelemetryRecorder,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, SpanRef};

#[derive(Debug, Default)]
struct Fields(BTreeMap<String, String>);

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

#[derive(Debug, Clone)]
struct CapturedSpan {
    parent: Option<String>,
    fields: BTreeMap<String, String>,
}

impl CapturedSpan {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    span: Option<String>,
    fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Index into `Capture::spans` plus the span's `otel.name`
struct Slot {
    index: usize,
    name: String,
}

fn slot_name<'a, S: LookupSpan<'a>>(span: &SpanRef<'a, S>) -> Option<String> {
    let extensions = span.extensions();
    extensions.get::<Slot>().map(|slot| slot.name.clone())
}

#[derive(Clone, Default)]
struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Capture {
    fn span(&self, name: &str) -> CapturedSpan {
        self.spans
            .lock()
            .iter()
            .find(|span| span.field("otel.name") == Some(name))
            .cloned()
            .unwrap_or_else(|| panic!("no span named {}", name))
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = Fields::default();
        attrs.record(&mut fields);

        let parent = span.parent().as_ref().and_then(slot_name);
        let name = fields.0.get("otel.name").cloned().unwrap_or_default();

        let index = {
            let mut spans = self.spans.lock();
            spans.push(CapturedSpan {
                parent,
                fields: fields.0,
            });
            spans.len() - 1
        };
        span.extensions_mut().insert(Slot { index, name });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let extensions = span.extensions();
        let Some(slot) = extensions.get::<Slot>() else {
            return;
        };
        let mut fields = Fields::default();
        values.record(&mut fields);
        self.spans.lock()[slot.index].fields.extend(fields.0);
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        event.record(&mut fields);
        let span = ctx.event_span(event).as_ref().and_then(slot_name);

        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            span,
            fields: fields.0,
        });
    }
}

fn capture() -> (Capture, tracing::subscriber::DefaultGuard) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::Registry::default().with(capture.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

/// Recorder without an explicit tracer, so it resolves the global default
fn default_recorder() -> TelemetryRecorder {
    TelemetryRecorder::new(TelemetryOptions::default())
}

#[tokio::test]
async fn test_default_recorder_emits_tracing_spans() {
    let (capture, _guard) = capture();
    let recorder = default_recorder();
    assert!(recorder.is_enabled());

    let result = recorder
        .record_span(
            RecordSpanOptions::new("search").with_attributes(
                AgenticSpanAttributes::new()
                    .literal("task.name", "search")
                    .input("task.input", || Some("rust".into())),
            ),
            |span| async move {
                assert!(span.is_recording());
                Ok::<_, TelemetryError>(3)
            },
        )
        .await;
    assert_eq!(result.unwrap(), 3);

    let span = capture.span("search");
    assert_eq!(span.parent, None);
    assert_eq!(span.field("otel.kind"), Some("internal"));
    assert_eq!(span.field("otel.scope.name"), Some("agentic"));
    assert_eq!(span.field("attributes"), Some("task.input=rust, task.name=search"));
    assert_eq!(span.field("otel.status_code"), None);

    let ended = capture
        .events()
        .into_iter()
        .find(|event| event.field("message") == Some("span ended"))
        .expect("span ended event");
    assert_eq!(ended.span.as_deref(), Some("search"));
}

#[tokio::test]
async fn test_nested_record_span_is_a_child_span() {
    let (capture, _guard) = capture();
    let recorder = default_recorder();

    let inner = recorder.clone();
    recorder
        .record_span(RecordSpanOptions::new("task.call"), |_span| async move {
            inner
                .record_span(RecordSpanOptions::new("task.attempt"), |_span| async {
                    Ok::<_, TelemetryError>(())
                })
                .await
        })
        .await
        .unwrap();

    assert_eq!(capture.span("task.call").parent, None);
    assert_eq!(capture.span("task.attempt").parent.as_deref(), Some("task.call"));
}

#[tokio::test]
async fn test_failure_sets_error_status_and_exception_event() {
    let (capture, _guard) = capture();

    let result = default_recorder()
        .record_span(RecordSpanOptions::new("install"), |_span| async {
            Err::<(), _>(TelemetryError::TracerAlreadySet)
        })
        .await;
    assert!(result.is_err());

    let span = capture.span("install");
    assert_eq!(span.field("otel.status_code"), Some("error"));
    assert_eq!(
        span.field("otel.status_message"),
        Some("Global tracer already initialised")
    );

    let exception = capture
        .events()
        .into_iter()
        .find(|event| event.field("message") == Some("exception"))
        .expect("exception event");
    assert_eq!(exception.level, Level::ERROR);
    assert_eq!(exception.span.as_deref(), Some("install"));
    assert_eq!(exception.field("exception_type"), Some("TelemetryError"));
    assert_eq!(
        exception.field("exception_message"),
        Some("Global tracer already initialised")
    );
}

#[tokio::test]
async fn test_error_after_early_end_is_logged_not_recorded() {
    let (capture, _guard) = capture();

    let result = default_recorder()
        .record_span(RecordSpanOptions::new("stream"), |span| async move {
            span.end();
            Err::<(), _>(TelemetryError::TracerAlreadySet)
        })
        .await;
    assert!(result.is_err());

    let span = capture.span("stream");
    assert_eq!(span.field("otel.status_code"), None);

    let events = capture.events();
    assert!(!events.iter().any(|event| event.field("message") == Some("exception")));

    let lost = events
        .iter()
        .find(|event| {
            event.field("message")
                == Some("operation failed after ending its span, error not recorded")
        })
        .expect("lost error is logged");
    assert_eq!(lost.level, Level::DEBUG);
    assert_eq!(lost.field("span"), Some("stream"));
}
