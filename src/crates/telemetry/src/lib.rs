//! Span recording for agentic tasks
//!
//! [`TelemetryRecorder`] wraps async operations in spans with explicit control
//! over which inputs and outputs end up in telemetry. Backends implement the
//! [`Tracer`] / [`Span`] traits; three ship with the crate:
//!
//! - [`TracingTracer`] - emits `tracing` spans (the process-wide default)
//! - [`NoopTracer`] - records nothing, used when telemetry is disabled
//! - [`InMemoryTracer`] - keeps spans for inspection in tests
//! - `OtelTracer` - bridges to the `opentelemetry` API (feature `otel`, on by
//!   default)
//!
//! # Modules
//!
//! - `attributes` - attribute values and deferred input/output producers
//! - `recorder` - the recorder and `record_span`
//! - `tracer` - tracer/span capability and the shared [`SpanHandle`]
//! - `config` - environment-driven recorder configuration
//! - `global` - process-wide default tracer

pub mod attributes;
pub mod config;
pub mod error;
pub mod global;
pub mod memory;
pub mod noop;
#[cfg(feature = "otel")]
pub mod otel;
pub mod recorder;
pub mod tracer;
pub mod tracing_tracer;

pub use attributes::{
    AgenticSpanAttributes, AttributeProducer, AttributeValue, Attributes, SpanAttribute,
    METADATA_PREFIX,
};
pub use config::TelemetryConfig;
pub use error::{ExceptionInfo, RecordableError, Result, TelemetryError};
pub use memory::{InMemoryTracer, SpanData, SpanEvent};
pub use noop::{NoopSpan, NoopTracer};
#[cfg(feature = "otel")]
pub use otel::OtelTracer;
pub use recorder::{record_error, RecordSpanOptions, TelemetryOptions, TelemetryRecorder};
pub use tracer::{Span, SpanHandle, SpanKind, SpanOptions, SpanStatus, Tracer};
pub use tracing_tracer::TracingTracer;
