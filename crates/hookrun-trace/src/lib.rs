//! Logging and OpenTelemetry integration for hookrun.
//!
//! Installs the process-wide `tracing` subscriber (plain or JSON output, with
//! an optional OTLP exporter) and provides the spans the pipeline runs under.

pub mod spans;
pub mod tracer;

pub use spans::execution_span;
pub use tracer::{OtlpConfig, TracerError, TracingConfig, init_tracer, shutdown_tracer};
