//! Trace sinks.
//!
//! Generation traces become one `info` event on the `funnel_engine::generation`
//! target, so any subscriber (JSON logs in production) can ship them to an
//! analysis backend.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::ports::{GenerationTrace, TraceError, TraceSink};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTraceSink;

impl TracingTraceSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TraceSink for TracingTraceSink {
    async fn record(&self, trace: GenerationTrace) -> Result<(), TraceError> {
        let prompt_name = trace.prompt_version.as_ref().map(|v| v.name.as_str());
        let prompt_version = trace.prompt_version.as_ref().map(|v| v.version);
        let tools = trace.tool_calls.join(",");

        match &trace.error {
            None => info!(
                target: "funnel_engine::generation",
                trace_id = %trace.trace_id,
                session_id = %trace.session_id,
                agent_id = %trace.agent_id,
                model = %trace.model,
                prompt_source = ?trace.prompt_source,
                prompt_name = ?prompt_name,
                prompt_version = ?prompt_version,
                latency_ms = trace.latency_ms,
                prompt_tokens = trace.usage.prompt_tokens,
                completion_tokens = trace.usage.completion_tokens,
                finish_reason = ?trace.finish_reason,
                tool_calls = %tools,
                output_chars = trace.output_chars,
                "Generation completed"
            ),
            Some(error) => warn!(
                target: "funnel_engine::generation",
                trace_id = %trace.trace_id,
                session_id = %trace.session_id,
                agent_id = %trace.agent_id,
                model = %trace.model,
                prompt_source = ?trace.prompt_source,
                latency_ms = trace.latency_ms,
                output_chars = trace.output_chars,
                error = %error,
                "Generation failed"
            ),
        }
        Ok(())
    }
}

/// Keeps every trace in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingTraceSink {
    traces: Arc<RwLock<Vec<GenerationTrace>>>,
}

impl RecordingTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn traces(&self) -> Vec<GenerationTrace> {
        self.traces.read().await.clone()
    }
}

#[async_trait]
impl TraceSink for RecordingTraceSink {
    async fn record(&self, trace: GenerationTrace) -> Result<(), TraceError> {
        self.traces.write().await.push(trace);
        Ok(())
    }
}
