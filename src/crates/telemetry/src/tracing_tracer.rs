//! Tracer backed by the `tracing` crate
//!
//! Every span becomes an `agentic.span` tracing span whose fields follow the
//! `otel.*` naming understood by `tracing-opentelemetry`, so an application
//! that installs that layer gets real OpenTelemetry spans for free. Exceptions
//! and span events are emitted as tracing events parented to the span.

use crate::attributes::{AttributeValue, Attributes};
use crate::error::ExceptionInfo;
use crate::tracer::{Span, SpanOptions, SpanStatus, Tracer};
use agentic_common::logging::format_duration;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::field;

const TARGET: &str = "agentic_telemetry";

/// Default tracer name
pub const DEFAULT_TRACER_NAME: &str = "agentic";

/// Tracer emitting `tracing` spans
#[derive(Debug, Clone)]
pub struct TracingTracer {
    name: String,
}

impl TracingTracer {
    /// Create a tracer; `name` is recorded as `otel.scope.name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for TracingTracer {
    fn default() -> Self {
        Self::new(DEFAULT_TRACER_NAME)
    }
}

impl Tracer for TracingTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> Box<dyn Span> {
        let span = tracing::info_span!(
            target: TARGET,
            "agentic.span",
            otel.name = %name,
            otel.kind = %options.kind,
            otel.scope.name = %self.name,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
            attributes = %format_attributes(&options.attributes),
        );

        Box::new(TracingSpan {
            name: name.to_string(),
            span: Mutex::new(Some(span)),
            attributes: Mutex::new(options.attributes),
            started: Instant::now(),
        })
    }
}

struct TracingSpan {
    name: String,
    span: Mutex<Option<tracing::Span>>,
    attributes: Mutex<Attributes>,
    started: Instant,
}

impl TracingSpan {
    fn with_span(&self, f: impl FnOnce(&tracing::Span)) {
        if let Some(span) = self.span.lock().as_ref() {
            f(span);
        }
    }
}

impl Span for TracingSpan {
    fn set_attribute(&self, key: &str, value: AttributeValue) {
        let rendered = {
            let mut attributes = self.attributes.lock();
            attributes.insert(key.to_string(), value);
            format_attributes(&attributes)
        };
        self.with_span(|span| {
            span.record("attributes", field::display(rendered));
        });
    }

    fn add_event(&self, name: &str, attributes: Attributes) {
        self.with_span(|span| {
            tracing::info!(
                target: TARGET,
                parent: span,
                event = %name,
                attributes = %format_attributes(&attributes),
                "span event"
            );
        });
    }

    fn record_exception(&self, exception: &ExceptionInfo) {
        self.with_span(|span| {
            tracing::error!(
                target: TARGET,
                parent: span,
                exception_type = %exception.name,
                exception_message = %exception.message,
                exception_stacktrace = exception.stacktrace.as_deref().unwrap_or(""),
                "exception"
            );
        });
    }

    fn set_status(&self, status: SpanStatus) {
        self.with_span(|span| {
            span.record("otel.status_code", status.code());
            if let SpanStatus::Error {
                message: Some(message),
            } = &status
            {
                span.record("otel.status_message", message.as_str());
            }
        });
    }

    fn end(&self) {
        // Dropping the last handle closes the tracing span
        if let Some(span) = self.span.lock().take() {
            tracing::debug!(
                target: TARGET,
                parent: &span,
                span = %self.name,
                duration = %format_duration(self.started.elapsed()),
                "span ended"
            );
        }
    }

    fn is_recording(&self) -> bool {
        self.span
            .lock()
            .as_ref()
            .map_or(false, |span| !span.is_disabled())
    }

    fn context(&self) -> tracing::Span {
        self.span
            .lock()
            .as_ref()
            .cloned()
            .unwrap_or_else(tracing::Span::none)
    }
}

/// Render attributes as `key=value` pairs in key order
fn format_attributes(attributes: &Attributes) -> String {
    attributes
        .iter()
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}
