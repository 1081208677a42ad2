//! Analytics port receiving post-hoc notification of routed tool calls.

use crate::tool_registry::domain::{McpServerName, PublicToolName};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of one routed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The backend returned a result.
    Success,
    /// The call failed; the message is the rendered gateway error.
    Failure {
        /// Failure description.
        message: String,
    },
}

impl InvocationOutcome {
    /// Returns whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A completed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationEvent {
    /// Public tool name the client called.
    pub public_name: PublicToolName,
    /// Server that owns the tool.
    pub server: McpServerName,
    /// Original tool name on the server.
    pub tool: String,
    /// Success or failure.
    pub outcome: InvocationOutcome,
    /// Wall time spent on the backend call.
    pub duration: Duration,
    /// Completion timestamp.
    pub completed_at: DateTime<Utc>,
}

/// Fire-and-forget sink for invocation outcomes.
///
/// Implementations must not block and cannot fail the invocation path.
#[cfg_attr(test, mockall::automock)]
pub trait InvocationRecorder: Send + Sync {
    /// Records one completed invocation.
    fn record(&self, event: InvocationEvent);
}
