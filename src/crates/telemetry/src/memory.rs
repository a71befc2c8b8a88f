//! In-memory tracer for inspecting recorded spans
//!
//! Keeps every span it starts, including attributes, status, exceptions,
//! events and how many times the backend was asked to end it. Used by the
//! test suites of this workspace and handy for asserting on instrumentation
//! in downstream crates.

use crate::attributes::{AttributeValue, Attributes};
use crate::error::ExceptionInfo;
use crate::tracer::{Span, SpanKind, SpanOptions, SpanStatus, Tracer};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Event recorded on a span
#[derive(Debug, Clone, PartialEq)]
pub struct SpanEvent {
    pub name: String,
    pub attributes: Attributes,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot of one recorded span
#[derive(Debug, Clone)]
pub struct SpanData {
    pub span_id: Uuid,
    pub name: String,
    pub kind: SpanKind,
    pub attributes: Attributes,
    pub status: SpanStatus,
    pub exceptions: Vec<ExceptionInfo>,
    pub events: Vec<SpanEvent>,
    /// Number of `end` calls the backend received
    pub end_count: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SpanData {
    pub fn is_ended(&self) -> bool {
        self.end_count > 0
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Events with the given name, in recording order
    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SpanEvent> + 'a {
        self.events.iter().filter(move |event| event.name == name)
    }
}

type SpanStore = Arc<Mutex<Vec<SpanData>>>;

/// Tracer that keeps spans in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTracer {
    spans: SpanStore,
}

impl InMemoryTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All spans started so far, in start order
    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().clone()
    }

    /// Spans that have been ended at least once
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .iter()
            .filter(|span| span.is_ended())
            .cloned()
            .collect()
    }

    /// All spans with the given name
    pub fn find(&self, name: &str) -> Vec<SpanData> {
        self.spans
            .lock()
            .iter()
            .filter(|span| span.name == name)
            .cloned()
            .collect()
    }

    /// Forget every recorded span
    pub fn reset(&self) {
        self.spans.lock().clear();
    }
}

impl Tracer for InMemoryTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> Box<dyn Span> {
        let span_id = Uuid::new_v4();
        self.spans.lock().push(SpanData {
            span_id,
            name: name.to_string(),
            kind: options.kind,
            attributes: options.attributes,
            status: SpanStatus::Unset,
            exceptions: Vec::new(),
            events: Vec::new(),
            end_count: 0,
            started_at: Utc::now(),
            ended_at: None,
        });

        Box::new(InMemorySpan {
            span_id,
            store: self.spans.clone(),
        })
    }
}

struct InMemorySpan {
    span_id: Uuid,
    store: SpanStore,
}

impl InMemorySpan {
    /// Apply `f` to this span's record; a no-op after `reset`
    fn update(&self, f: impl FnOnce(&mut SpanData)) {
        let mut spans = self.store.lock();
        if let Some(data) = spans.iter_mut().find(|data| data.span_id == self.span_id) {
            f(data);
        }
    }
}

impl Span for InMemorySpan {
    fn set_attribute(&self, key: &str, value: AttributeValue) {
        self.update(|data| {
            data.attributes.insert(key.to_string(), value);
        });
    }

    fn add_event(&self, name: &str, attributes: Attributes) {
        self.update(|data| {
            data.events.push(SpanEvent {
                name: name.to_string(),
                attributes,
                timestamp: Utc::now(),
            });
        });
    }

    fn record_exception(&self, exception: &ExceptionInfo) {
        self.update(|data| data.exceptions.push(exception.clone()));
    }

    fn set_status(&self, status: SpanStatus) {
        self.update(|data| data.status = status);
    }

    fn end(&self) {
        self.update(|data| {
            data.end_count += 1;
            data.ended_at.get_or_insert_with(Utc::now);
        });
    }

    fn is_recording(&self) -> bool {
        true
    }

    fn context(&self) -> tracing::Span {
        tracing::Span::none()
    }
}
