//! Tracer backed by the `opentelemetry` API
//!
//! [`OtelTracer::global`] wraps `opentelemetry::global::tracer`, so spans go
//! to whatever provider the application installed; without one they are
//! non-recording. Parents come from the ambient OpenTelemetry [`Context`].
//! Exceptions follow the semantic conventions: an `exception` event carrying
//! `exception.type`, `exception.message` and `exception.stacktrace`.

use crate::attributes::{AttributeValue, Attributes};
use crate::error::ExceptionInfo;
use crate::tracer::{Span, SpanKind, SpanOptions, SpanStatus, Tracer};
use crate::tracing_tracer::DEFAULT_TRACER_NAME;
use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{self as otel, Span as _, Tracer as _};
use opentelemetry::{Array, Context, KeyValue, StringValue, Value};
use parking_lot::Mutex;
use std::fmt;

/// Tracer bridging to an OpenTelemetry tracer
pub struct OtelTracer<T = BoxedTracer> {
    tracer: T,
}

impl OtelTracer<BoxedTracer> {
    /// Tracer named `name` from the globally installed provider
    pub fn global(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self::new(global::tracer(name))
    }
}

impl Default for OtelTracer<BoxedTracer> {
    fn default() -> Self {
        Self::global(DEFAULT_TRACER_NAME)
    }
}

impl<T> OtelTracer<T> {
    pub fn new(tracer: T) -> Self {
        Self { tracer }
    }
}

impl<T> fmt::Debug for OtelTracer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtelTracer").finish_non_exhaustive()
    }
}

impl<T> Tracer for OtelTracer<T>
where
    T: otel::Tracer + Send + Sync,
    T::Span: Send + Sync + 'static,
{
    fn start_span(&self, name: &str, options: SpanOptions) -> Box<dyn Span> {
        let builder = self
            .tracer
            .span_builder(name.to_string())
            .with_kind(otel_kind(options.kind))
            .with_attributes(options.attributes.into_iter().map(|(k, v)| key_value(k, v)));
        let span = self.tracer.build_with_context(builder, &Context::current());

        Box::new(OtelSpan {
            span: Mutex::new(span),
        })
    }
}

struct OtelSpan<S> {
    span: Mutex<S>,
}

impl<S> Span for OtelSpan<S>
where
    S: otel::Span + Send + Sync,
{
    fn set_attribute(&self, key: &str, value: AttributeValue) {
        self.span.lock().set_attribute(key_value(key.to_string(), value));
    }

    fn add_event(&self, name: &str, attributes: Attributes) {
        let attributes = attributes.into_iter().map(|(k, v)| key_value(k, v)).collect();
        self.span.lock().add_event(name.to_string(), attributes);
    }

    fn record_exception(&self, exception: &ExceptionInfo) {
        let mut attributes = vec![
            KeyValue::new("exception.type", exception.name.clone()),
            KeyValue::new("exception.message", exception.message.clone()),
        ];
        if let Some(stacktrace) = &exception.stacktrace {
            attributes.push(KeyValue::new("exception.stacktrace", stacktrace.clone()));
        }
        self.span.lock().add_event("exception", attributes);
    }

    fn set_status(&self, status: SpanStatus) {
        self.span.lock().set_status(otel_status(status));
    }

    fn end(&self) {
        self.span.lock().end();
    }

    fn is_recording(&self) -> bool {
        self.span.lock().is_recording()
    }

    fn context(&self) -> tracing::Span {
        tracing::Span::none()
    }
}

fn otel_kind(kind: SpanKind) -> otel::SpanKind {
    match kind {
        SpanKind::Internal => otel::SpanKind::Internal,
        SpanKind::Server => otel::SpanKind::Server,
        SpanKind::Client => otel::SpanKind::Client,
        SpanKind::Producer => otel::SpanKind::Producer,
        SpanKind::Consumer => otel::SpanKind::Consumer,
    }
}

fn otel_status(status: SpanStatus) -> otel::Status {
    match status {
        SpanStatus::Unset => otel::Status::Unset,
        SpanStatus::Ok => otel::Status::Ok,
        SpanStatus::Error { message } => otel::Status::error(message.unwrap_or_default()),
    }
}

fn otel_value(value: AttributeValue) -> Value {
    match value {
        AttributeValue::Bool(v) => Value::Bool(v),
        AttributeValue::Int(v) => Value::I64(v),
        AttributeValue::Float(v) => Value::F64(v),
        AttributeValue::String(v) => Value::String(v.into()),
        AttributeValue::BoolArray(v) => Value::Array(Array::Bool(v)),
        AttributeValue::IntArray(v) => Value::Array(Array::I64(v)),
        AttributeValue::FloatArray(v) => Value::Array(Array::F64(v)),
        AttributeValue::StringArray(v) => {
            Value::Array(Array::String(v.into_iter().map(StringValue::from).collect()))
        }
    }
}

fn key_value(key: String, value: AttributeValue) -> KeyValue {
    KeyValue::new(key, otel_value(value))
}
