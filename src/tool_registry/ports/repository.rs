//! Repository port for the persisted server registry and its tool rows.

use crate::tool_registry::domain::{McpServer, McpServerId, McpServerName, McpToolRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for MCP server registry operations.
pub type McpServerRegistryResult<T> = Result<T, McpServerRegistryError>;

/// Persistence contract for backend servers and the tools they own.
///
/// Implementations perform no network I/O.
#[async_trait]
pub trait McpServerRegistryRepository: Send + Sync {
    /// Stores a new server.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::DuplicateServer`] when the ID already
    /// exists or [`McpServerRegistryError::DuplicateServerName`] when the name
    /// is already registered.
    async fn register(&self, server: &McpServer) -> McpServerRegistryResult<()>;

    /// Deletes a server and, in the same transaction, every tool it owns.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::ServerNotFound`] when no server has
    /// the given name.
    async fn remove(&self, server_name: &McpServerName) -> McpServerRegistryResult<()>;

    /// Finds a server by unique name.
    async fn find_by_name(
        &self,
        server_name: &McpServerName,
    ) -> McpServerRegistryResult<Option<McpServer>>;

    /// Returns all servers ordered by name.
    async fn list_all(&self) -> McpServerRegistryResult<Vec<McpServer>>;

    /// Stores a tool row for an existing server.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::UnknownServer`] when the owning
    /// server does not exist and [`McpServerRegistryError::DuplicateTool`]
    /// when the server already owns a tool with the same name.
    async fn add_tool(&self, tool: &McpToolRecord) -> McpServerRegistryResult<()>;

    /// Deletes one tool row.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::ToolNotFound`] when the row does not
    /// exist.
    async fn remove_tool(
        &self,
        server_id: McpServerId,
        tool_name: &str,
    ) -> McpServerRegistryResult<()>;

    /// Returns every tool row owned by a server, ordered by tool name.
    async fn list_tools(&self, server_id: McpServerId)
    -> McpServerRegistryResult<Vec<McpToolRecord>>;
}

/// Errors returned by MCP server registry repository implementations.
#[derive(Debug, Clone, Error)]
pub enum McpServerRegistryError {
    /// A server with the same identifier already exists.
    #[error("duplicate MCP server identifier: {0}")]
    DuplicateServer(McpServerId),

    /// A server with the same name already exists.
    #[error("duplicate MCP server name: {0}")]
    DuplicateServerName(McpServerName),

    /// No server has the requested name.
    #[error("MCP server not found: {0}")]
    ServerNotFound(McpServerName),

    /// A tool row referenced a server that does not exist.
    #[error("unknown MCP server identifier: {0}")]
    UnknownServer(McpServerId),

    /// The server already owns a tool with the same name.
    #[error("MCP server {server_id} already has a tool named '{tool_name}'")]
    DuplicateTool {
        /// Owning server identifier.
        server_id: McpServerId,
        /// Original tool name.
        tool_name: String,
    },

    /// The tool row does not exist.
    #[error("MCP server {server_id} has no tool named '{tool_name}'")]
    ToolNotFound {
        /// Owning server identifier.
        server_id: McpServerId,
        /// Original tool name.
        tool_name: String,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted MCP server data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl McpServerRegistryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
