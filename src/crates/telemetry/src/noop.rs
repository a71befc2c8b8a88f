//! Tracer that records nothing

use crate::attributes::{AttributeValue, Attributes};
use crate::error::ExceptionInfo;
use crate::tracer::{Span, SpanOptions, SpanStatus, Tracer};

/// Tracer substituted when telemetry is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl NoopTracer {
    pub fn new() -> Self {
        Self
    }
}

impl Tracer for NoopTracer {
    fn start_span(&self, _name: &str, _options: SpanOptions) -> Box<dyn Span> {
        Box::new(NoopSpan)
    }
}

/// Inert span returned by [`NoopTracer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpan;

impl Span for NoopSpan {
    fn set_attribute(&self, _key: &str, _value: AttributeValue) {}

    fn add_event(&self, _name: &str, _attributes: Attributes) {}

    fn record_exception(&self, _exception: &ExceptionInfo) {}

    fn set_status(&self, _status: SpanStatus) {}

    fn end(&self) {}

    fn is_recording(&self) -> bool {
        false
    }

    fn context(&self) -> tracing::Span {
        tracing::Span::none()
    }
}
