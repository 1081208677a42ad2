//! In-memory repository for backend servers and their tool rows.

use crate::tool_registry::{
    domain::{McpServer, McpServerId, McpServerName, McpToolRecord},
    ports::{McpServerRegistryError, McpServerRegistryRepository, McpServerRegistryResult},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe in-memory MCP server registry repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMcpServerRegistry {
    state: Arc<RwLock<InMemoryRegistryState>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    servers: HashMap<McpServerId, McpServer>,
    name_index: BTreeMap<McpServerName, McpServerId>,
    tools: HashMap<McpServerId, BTreeMap<String, McpToolRecord>>,
}

impl InMemoryMcpServerRegistry {
    /// Creates an empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error<T>(err: PoisonError<T>) -> McpServerRegistryError {
    McpServerRegistryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl McpServerRegistryRepository for InMemoryMcpServerRegistry {
    async fn register(&self, server: &McpServer) -> McpServerRegistryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;

        if state.servers.contains_key(&server.id()) {
            return Err(McpServerRegistryError::DuplicateServer(server.id()));
        }

        if state.name_index.contains_key(server.name()) {
            return Err(McpServerRegistryError::DuplicateServerName(
                server.name().clone(),
            ));
        }

        state.name_index.insert(server.name().clone(), server.id());
        state.servers.insert(server.id(), server.clone());
        Ok(())
    }

    async fn remove(&self, server_name: &McpServerName) -> McpServerRegistryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;

        let server_id = state
            .name_index
            .remove(server_name)
            .ok_or_else(|| McpServerRegistryError::ServerNotFound(server_name.clone()))?;
        state.servers.remove(&server_id);
        state.tools.remove(&server_id);
        Ok(())
    }

    async fn find_by_name(
        &self,
        server_name: &McpServerName,
    ) -> McpServerRegistryResult<Option<McpServer>> {
        let state = self.state.read().map_err(lock_error)?;
        let server = state
            .name_index
            .get(server_name)
            .and_then(|id| state.servers.get(id))
            .cloned();
        Ok(server)
    }

    async fn list_all(&self) -> McpServerRegistryResult<Vec<McpServer>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .name_index
            .values()
            .filter_map(|id| state.servers.get(id))
            .cloned()
            .collect())
    }

    async fn add_tool(&self, tool: &McpToolRecord) -> McpServerRegistryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;

        if !state.servers.contains_key(&tool.server_id()) {
            return Err(McpServerRegistryError::UnknownServer(tool.server_id()));
        }

        let server_tools = state.tools.entry(tool.server_id()).or_default();
        if server_tools.contains_key(tool.name()) {
            return Err(McpServerRegistryError::DuplicateTool {
                server_id: tool.server_id(),
                tool_name: tool.name().to_owned(),
            });
        }

        server_tools.insert(tool.name().to_owned(), tool.clone());
        Ok(())
    }

    async fn remove_tool(
        &self,
        server_id: McpServerId,
        tool_name: &str,
    ) -> McpServerRegistryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;

        state
            .tools
            .get_mut(&server_id)
            .and_then(|server_tools| server_tools.remove(tool_name))
            .map(|_| ())
            .ok_or_else(|| McpServerRegistryError::ToolNotFound {
                server_id,
                tool_name: tool_name.to_owned(),
            })
    }

    async fn list_tools(
        &self,
        server_id: McpServerId,
    ) -> McpServerRegistryResult<Vec<McpToolRecord>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .tools
            .get(&server_id)
            .map(|server_tools| server_tools.values().cloned().collect())
            .unwrap_or_default())
    }
}
