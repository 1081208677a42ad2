//! Invocation recorder that emits one structured log line per call.

use crate::tool_registry::ports::{InvocationEvent, InvocationOutcome, InvocationRecorder};
use tracing::info;

/// Records invocation outcomes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInvocationRecorder;

impl InvocationRecorder for TracingInvocationRecorder {
    fn record(&self, event: InvocationEvent) {
        let duration_ms = u64::try_from(event.duration.as_millis()).unwrap_or(u64::MAX);
        match event.outcome {
            InvocationOutcome::Success => info!(
                tool = %event.public_name,
                server = %event.server,
                duration_ms,
                completed_at = %event.completed_at,
                "tool invocation succeeded"
            ),
            InvocationOutcome::Failure { message } => info!(
                tool = %event.public_name,
                server = %event.server,
                duration_ms,
                completed_at = %event.completed_at,
                error = %message,
                "tool invocation failed"
            ),
        }
    }
}
