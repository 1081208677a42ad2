//! Port contracts for the gateway core.

mod analytics;
mod backend;
mod repository;

#[cfg(test)]
pub use analytics::MockInvocationRecorder;
pub use analytics::{InvocationEvent, InvocationOutcome, InvocationRecorder};
pub use backend::{
    BackendTool, McpBackendConnector, McpBackendError, McpBackendResult, McpBackendSession,
    ToolArguments,
};
pub use repository::{
    McpServerRegistryError, McpServerRegistryRepository, McpServerRegistryResult,
};
