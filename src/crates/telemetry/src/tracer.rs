//! Tracer and span capability
//!
//! The recorder only talks to these traits; the backend (no-op, `tracing`,
//! in-memory, or a caller-supplied exporter bridge) is injected.

use crate::attributes::{AttributeValue, Attributes};
use crate::error::ExceptionInfo;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Role of a span in a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpanKind {
    #[default]
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Server => "server",
            Self::Client => "client",
            Self::Producer => "producer",
            Self::Consumer => "consumer",
        }
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of a span
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error { message: Option<String> },
}

impl SpanStatus {
    /// Error status carrying a description
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Status code as reported to `tracing` (`unset`, `ok`, `error`)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Ok => "ok",
            Self::Error { .. } => "error",
        }
    }
}

/// Options used when starting a span
#[derive(Debug, Clone, Default)]
pub struct SpanOptions {
    pub kind: SpanKind,
    pub attributes: Attributes,
}

/// A single span as seen by a tracer backend
///
/// Methods take `&self`; backends use interior mutability so a span can be
/// shared between the recorder and the traced operation.
pub trait Span: Send + Sync {
    fn set_attribute(&self, key: &str, value: AttributeValue);

    fn add_event(&self, name: &str, attributes: Attributes);

    fn record_exception(&self, exception: &ExceptionInfo);

    fn set_status(&self, status: SpanStatus);

    /// Finish the span. Backends may assume this is called once.
    fn end(&self);

    fn is_recording(&self) -> bool;

    /// The `tracing` span that child work should be instrumented with
    fn context(&self) -> tracing::Span;
}

/// Creates spans
pub trait Tracer: Send + Sync {
    fn start_span(&self, name: &str, options: SpanOptions) -> Box<dyn Span>;
}

struct SpanInner {
    span: Box<dyn Span>,
    ended: AtomicBool,
}

/// Shared handle to a started span
///
/// Cloning is cheap. [`SpanHandle::end`] forwards to the backend at most once
/// no matter how many clones call it; calls after the end are ignored.
#[derive(Clone)]
pub struct SpanHandle {
    inner: Arc<SpanInner>,
}

impl SpanHandle {
    pub fn new(span: Box<dyn Span>) -> Self {
        Self {
            inner: Arc::new(SpanInner {
                span,
                ended: AtomicBool::new(false),
            }),
        }
    }

    /// End the span. Returns `true` only for the call that actually ended it.
    pub fn end(&self) -> bool {
        if self.inner.ended.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.inner.span.end();
        true
    }

    pub fn is_ended(&self) -> bool {
        self.inner.ended.load(Ordering::Acquire)
    }

    pub fn set_attribute(&self, key: &str, value: impl Into<AttributeValue>) {
        if !self.is_ended() {
            self.inner.span.set_attribute(key, value.into());
        }
    }

    pub fn set_attributes(&self, attributes: Attributes) {
        if self.is_ended() {
            return;
        }
        for (key, value) in attributes {
            self.inner.span.set_attribute(&key, value);
        }
    }

    pub fn add_event(&self, name: &str, attributes: Attributes) {
        if !self.is_ended() {
            self.inner.span.add_event(name, attributes);
        }
    }

    pub fn record_exception(&self, exception: &ExceptionInfo) {
        if !self.is_ended() {
            self.inner.span.record_exception(exception);
        }
    }

    pub fn set_status(&self, status: SpanStatus) {
        if !self.is_ended() {
            self.inner.span.set_status(status);
        }
    }

    /// Whether the backend records anything and the span is still open
    pub fn is_recording(&self) -> bool {
        !self.is_ended() && self.inner.span.is_recording()
    }

    pub fn context(&self) -> tracing::Span {
        self.inner.span.context()
    }
}

impl fmt::Debug for SpanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanHandle")
            .field("ended", &self.is_ended())
            .finish_non_exhaustive()
    }
}
