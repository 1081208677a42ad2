//! Gateway error taxonomy shared by the orchestrator and the router.

use super::catalog::CatalogError;
use crate::tool_registry::{
    domain::{McpServerName, PublicToolName, ToolRegistryDomainError},
    ports::{McpBackendError, McpServerRegistryError},
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Coarse classification of a [`McpGatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorKind {
    /// Malformed caller input.
    Validation,
    /// Name already taken.
    Conflict,
    /// Referenced server or tool does not exist.
    NotFound,
    /// Network, timeout, or unreachable backend.
    Transport,
    /// Backend answered but broke the message contract.
    Protocol,
    /// A routed call failed at the backend.
    Invocation,
    /// Persistence or runtime failure inside the gateway.
    Internal,
}

impl GatewayErrorKind {
    /// Returns the stable snake-case code for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Invocation => "invocation",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Errors returned by gateway services.
#[derive(Debug, Error)]
pub enum McpGatewayError {
    /// Input failed domain validation.
    #[error(transparent)]
    Validation(#[from] ToolRegistryDomainError),

    /// A server with the same name is already registered.
    #[error("MCP server '{0}' is already registered")]
    DuplicateServer(McpServerName),

    /// A public tool name is already published.
    #[error("tool '{0}' is already published")]
    DuplicateTool(PublicToolName),

    /// No server has the given name.
    #[error("MCP server '{0}' not found")]
    ServerNotFound(McpServerName),

    /// No tool is published under the given public name.
    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    /// The backend could not be reached or did not answer in time.
    #[error("cannot reach MCP server '{server}': {source}")]
    Transport {
        /// Server that failed.
        server: McpServerName,
        /// Backend failure.
        source: McpBackendError,
    },

    /// The backend answered with something other than a valid MCP message.
    #[error("MCP server '{server}' violated the protocol: {source}")]
    Protocol {
        /// Server that failed.
        server: McpServerName,
        /// Backend failure.
        source: McpBackendError,
    },

    /// A routed tool call failed at the backend.
    #[error("call to tool '{tool}' on MCP server '{server}' failed: {source}")]
    Invocation {
        /// Server that owns the tool.
        server: McpServerName,
        /// Original tool name.
        tool: String,
        /// Backend failure.
        source: McpBackendError,
    },

    /// Eviction stopped at the first failing step and was rolled back.
    #[error("deregistration of MCP server '{server}' aborted: {source}")]
    EvictionAborted {
        /// Server whose eviction was aborted.
        server: McpServerName,
        /// Failure that caused the abort.
        source: Box<Self>,
    },

    /// The catalog lock was poisoned.
    #[error("tool catalog is unavailable")]
    CatalogUnavailable,

    /// Persistence-layer failure.
    #[error(transparent)]
    Persistence(McpServerRegistryError),

    /// A registration or deregistration task panicked or was aborted.
    #[error("registry task did not complete: {0}")]
    Interrupted(Arc<tokio::task::JoinError>),
}

/// Result type for gateway services.
pub type McpGatewayResult<T> = Result<T, McpGatewayError>;

impl McpGatewayError {
    /// Attributes a backend failure to `server`, keeping the transport and
    /// protocol classes apart.
    #[must_use]
    pub fn backend(server: McpServerName, source: McpBackendError) -> Self {
        if source.is_transport() {
            Self::Transport { server, source }
        } else {
            Self::Protocol { server, source }
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::Validation(_) => GatewayErrorKind::Validation,
            Self::DuplicateServer(_) | Self::DuplicateTool(_) => GatewayErrorKind::Conflict,
            Self::ServerNotFound(_) | Self::ToolNotFound(_) => GatewayErrorKind::NotFound,
            Self::Transport { .. } => GatewayErrorKind::Transport,
            Self::Protocol { .. } => GatewayErrorKind::Protocol,
            Self::Invocation { .. } => GatewayErrorKind::Invocation,
            Self::EvictionAborted { source, .. } => source.kind(),
            Self::CatalogUnavailable | Self::Persistence(_) | Self::Interrupted(_) => {
                GatewayErrorKind::Internal
            }
        }
    }

    /// Returns the server this error is attributed to, when there is one.
    #[must_use]
    pub const fn server(&self) -> Option<&McpServerName> {
        match self {
            Self::DuplicateServer(server)
            | Self::ServerNotFound(server)
            | Self::Transport { server, .. }
            | Self::Protocol { server, .. }
            | Self::Invocation { server, .. }
            | Self::EvictionAborted { server, .. } => Some(server),
            _ => None,
        }
    }
}

impl From<McpServerRegistryError> for McpGatewayError {
    fn from(err: McpServerRegistryError) -> Self {
        match err {
            McpServerRegistryError::DuplicateServerName(name) => Self::DuplicateServer(name),
            McpServerRegistryError::ServerNotFound(name) => Self::ServerNotFound(name),
            other => Self::Persistence(other),
        }
    }
}

impl From<CatalogError> for McpGatewayError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Conflict(name) => Self::DuplicateTool(name),
            CatalogError::NotFound(name) => Self::ToolNotFound(name),
            CatalogError::LockPoisoned => Self::CatalogUnavailable,
        }
    }
}
