//! Telemetry adapters.
//!
//! - `TracingTraceSink` - Generation traces as structured `tracing` events
//! - `RecordingTraceSink` - Keeps traces in memory for assertions

mod trace_sink;

pub use trace_sink::{RecordingTraceSink, TracingTraceSink};
