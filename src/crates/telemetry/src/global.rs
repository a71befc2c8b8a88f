//! Process-wide default tracer
//!
//! Recorders built without an explicit tracer use [`tracer`]. The default is a
//! [`TracingTracer`] created on first access; an application may install its
//! own once via [`set_tracer`], before anything reads the default.

use crate::error::{Result, TelemetryError};
use crate::tracer::Tracer;
use crate::tracing_tracer::TracingTracer;
use std::sync::{Arc, OnceLock};

static GLOBAL_TRACER: OnceLock<Arc<dyn Tracer>> = OnceLock::new();

/// The process-wide default tracer
pub fn tracer() -> Arc<dyn Tracer> {
    GLOBAL_TRACER
        .get_or_init(|| Arc::new(TracingTracer::default()))
        .clone()
}

/// Install the process-wide default tracer
///
/// Fails with [`TelemetryError::TracerAlreadySet`] if a tracer was installed
/// before or the default was already handed out.
pub fn set_tracer(tracer: Arc<dyn Tracer>) -> Result<()> {
    GLOBAL_TRACER
        .set(tracer)
        .map_err(|_| TelemetryError::TracerAlreadySet)
}
