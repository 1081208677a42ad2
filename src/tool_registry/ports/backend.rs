//! Backend port: the uniform capability every MCP transport provides.
//!
//! The orchestrator and the router depend only on these traits. A connector
//! opens sessions; a session lists tools, invokes them, and closes.

use crate::tool_registry::domain::McpServer;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Arguments for a tool call: an opaque JSON object passed through untouched.
pub type ToolArguments = Map<String, Value>;

/// Result type for backend operations.
pub type McpBackendResult<T> = Result<T, McpBackendError>;

/// A tool as reported by a backend, before domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTool {
    /// Original tool name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Input schema as reported.
    pub input_schema: Value,
    /// Optional output schema.
    pub output_schema: Option<Value>,
}

impl BackendTool {
    /// Creates a tool with an empty object input schema and no description.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: serde_json::json!({"type": "object"}),
            output_schema: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, input_schema: Value) -> Self {
        self.input_schema = input_schema;
        self
    }
}

/// Opens sessions to backend servers.
#[async_trait]
pub trait McpBackendConnector: Send + Sync {
    /// Opens a session to `server` and performs the protocol handshake.
    ///
    /// # Errors
    ///
    /// Returns a transport-class [`McpBackendError`] when the endpoint is
    /// unreachable, and [`McpBackendError::Protocol`] when it does not speak
    /// the expected protocol.
    async fn open(&self, server: &McpServer) -> McpBackendResult<Arc<dyn McpBackendSession>>;
}

/// A live session to one backend, safe for concurrent use.
#[async_trait]
pub trait McpBackendSession: Send + Sync {
    /// Returns the backend's current tool set.
    async fn list_tools(&self) -> McpBackendResult<Vec<BackendTool>>;

    /// Invokes one tool and returns the backend's structured result.
    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Option<ToolArguments>,
    ) -> McpBackendResult<Value>;

    /// Releases the session. Calling this more than once is harmless.
    async fn close(&self);
}

/// Errors raised by backend sessions.
#[derive(Debug, Clone, Error)]
pub enum McpBackendError {
    /// Network failure or unreachable endpoint.
    #[error("transport failure: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The call did not complete within the configured bound.
    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),

    /// The session was already closed.
    #[error("backend session is closed")]
    SessionClosed,

    /// The backend answered but violated the message contract.
    #[error("protocol violation: {0}")]
    Protocol(Arc<dyn std::error::Error + Send + Sync>),
}

impl McpBackendError {
    /// Wraps a transport-layer failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Wraps a protocol-level failure.
    pub fn protocol(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Protocol(Arc::new(err))
    }

    /// Builds a transport failure from a message.
    pub fn transport_message(message: impl Into<String>) -> Self {
        Self::transport(BackendFault(message.into()))
    }

    /// Builds a protocol failure from a message.
    pub fn protocol_message(message: impl Into<String>) -> Self {
        Self::protocol(BackendFault(message.into()))
    }

    /// Returns whether the failure means the session can no longer be trusted.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        !matches!(self, Self::Protocol(_))
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct BackendFault(String);
