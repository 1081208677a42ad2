//! Registration and deregistration orchestration.
//!
//! Admission is best-effort per tool: once the server row exists, a tool that
//! fails validation, persistence, or publication is logged and skipped.
//! Eviction is all-or-nothing on the tool set: the first failure rolls back
//! every tool already removed and leaves the server in place.

use super::{
    catalog::{CatalogEntry, ToolCatalog},
    connections::McpConnectionManager,
    error::{McpGatewayError, McpGatewayResult},
};
use crate::tool_registry::{
    domain::{
        BearerToken, McpEndpoint, McpServer, McpServerName, McpToolDefinition, McpToolRecord,
        PublicToolName,
    },
    ports::{
        BackendTool, McpBackendConnector, McpServerRegistryError, McpServerRegistryRepository,
    },
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

/// Request payload for registering a backend server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterMcpServerRequest {
    /// Unique server name.
    pub name: String,
    /// HTTP or HTTPS endpoint.
    pub endpoint: String,
    /// Optional bearer credential passed through to the backend.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

impl RegisterMcpServerRequest {
    /// Creates a registration request without credential or description.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            bearer_token: None,
            description: None,
        }
    }

    /// Sets the bearer credential.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A discovered tool that was not published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTool {
    /// Tool name as reported by the backend.
    pub tool_name: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRegistration {
    /// The persisted server.
    pub server: McpServer,
    /// Public names published for this server.
    pub published: Vec<PublicToolName>,
    /// Tools skipped under the best-effort policy.
    pub skipped: Vec<SkippedTool>,
}

/// Outcome of a tool re-discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolRefresh {
    /// Newly published public names.
    pub added: Vec<PublicToolName>,
    /// Public names retracted because the backend no longer offers them.
    pub removed: Vec<PublicToolName>,
    /// Tools that could not be published or retracted.
    pub skipped: Vec<SkippedTool>,
}

/// Counts reported after rebuilding the catalog from persisted rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogRestore {
    /// Servers read from the registry.
    pub servers: usize,
    /// Tools republished.
    pub tools: usize,
}

struct RemovedTool {
    entry: CatalogEntry,
    record: Option<McpToolRecord>,
}

type LockTable = Mutex<HashMap<McpServerName, Arc<tokio::sync::Mutex<()>>>>;

/// Serialises admission, eviction, and re-discovery of one server name.
/// Different names never contend.
#[derive(Default)]
struct ServerLocks {
    table: Arc<LockTable>,
}

impl ServerLocks {
    async fn acquire(&self, name: &McpServerName) -> ServerLockGuard {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(name.clone()).or_default())
        };
        ServerLockGuard {
            guard: Some(lock.lock_owned().await),
            name: name.clone(),
            table: Arc::clone(&self.table),
        }
    }
}

/// Held for the whole of one workflow; the table entry is dropped with the
/// last holder.
struct ServerLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    name: McpServerName,
    table: Arc<LockTable>,
}

impl Drop for ServerLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table
            .get(&self.name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.name);
        }
    }
}

/// Orchestrates admission and eviction of backend servers.
///
/// Admission, eviction, and re-discovery of the same server name run one at
/// a time; work on different servers proceeds in parallel.
pub struct McpServerLifecycleService<R, K, C>
where
    R: McpServerRegistryRepository + ?Sized,
    K: McpBackendConnector + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    catalog: Arc<ToolCatalog>,
    connections: Arc<McpConnectionManager<K>>,
    clock: Arc<C>,
    locks: Arc<ServerLocks>,
}

impl<R, K, C> Clone for McpServerLifecycleService<R, K, C>
where
    R: McpServerRegistryRepository + ?Sized,
    K: McpBackendConnector + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            catalog: Arc::clone(&self.catalog),
            connections: Arc::clone(&self.connections),
            clock: Arc::clone(&self.clock),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<R, K, C> McpServerLifecycleService<R, K, C>
where
    R: McpServerRegistryRepository + ?Sized + 'static,
    K: McpBackendConnector + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        catalog: Arc<ToolCatalog>,
        connections: Arc<McpConnectionManager<K>>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            catalog,
            connections,
            clock,
            locks: Arc::new(ServerLocks::default()),
        }
    }

    /// Admits a backend server.
    ///
    /// The work runs on its own task, so dropping the returned future does
    /// not interrupt an admission that has started.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input, a conflict when the
    /// name is taken, or a transport/protocol error when the probe fails. A
    /// failed probe leaves the registry and catalog unchanged.
    pub async fn register(
        &self,
        request: RegisterMcpServerRequest,
    ) -> McpGatewayResult<ServerRegistration> {
        let service = self.clone();
        tokio::spawn(async move { service.admit(request).await })
            .await
            .map_err(|err| McpGatewayError::Interrupted(Arc::new(err)))?
    }

    /// Evicts a backend server and every tool it contributed.
    ///
    /// Like [`Self::register`], the work runs on its own task.
    ///
    /// # Errors
    ///
    /// Returns [`McpGatewayError::ServerNotFound`] when the server is absent
    /// and [`McpGatewayError::EvictionAborted`] when a step failed; in that
    /// case the server and all of its tools are still in place.
    pub async fn deregister(&self, server_name: &str) -> McpGatewayResult<()> {
        let name = McpServerName::new(server_name)?;
        let service = self.clone();
        tokio::spawn(async move { service.evict(name).await })
            .await
            .map_err(|err| McpGatewayError::Interrupted(Arc::new(err)))?
    }

    async fn admit(
        &self,
        request: RegisterMcpServerRequest,
    ) -> McpGatewayResult<ServerRegistration> {
        let server = self.build_server(request)?;
        let name = server.name().clone();
        let _lock = self.locks.acquire(&name).await;

        if self.repository.find_by_name(&name).await?.is_some() {
            return Err(McpGatewayError::DuplicateServer(name));
        }

        let session = self
            .connections
            .open(&server)
            .await
            .map_err(|err| McpGatewayError::backend(name.clone(), err))?;
        let discovered = match self.connections.list_tools(&session).await {
            Ok(tools) => tools,
            Err(err) => {
                session.close().await;
                return Err(McpGatewayError::backend(name, err));
            }
        };

        if let Err(err) = self.repository.register(&server).await {
            session.close().await;
            return Err(err.into());
        }
        self.connections.attach(name.clone(), session).await;

        let mut registration = ServerRegistration {
            server,
            published: Vec::new(),
            skipped: Vec::new(),
        };
        for tool in &discovered {
            match self.admit_tool(&registration.server, tool).await {
                Ok(public_name) => registration.published.push(public_name),
                Err(reason) => registration.skipped.push(SkippedTool {
                    tool_name: tool.name.clone(),
                    reason,
                }),
            }
        }

        info!(
            server = %name,
            published = registration.published.len(),
            skipped = registration.skipped.len(),
            "registered MCP server"
        );
        Ok(registration)
    }

    fn build_server(&self, request: RegisterMcpServerRequest) -> McpGatewayResult<McpServer> {
        let RegisterMcpServerRequest {
            name,
            endpoint,
            bearer_token,
            description,
        } = request;

        let server_name = McpServerName::new(name)?;
        let server_endpoint = McpEndpoint::parse(endpoint)?;
        let token = bearer_token.map(BearerToken::new).transpose()?;

        let base = McpServer::new(server_name, server_endpoint, &*self.clock)
            .with_description(description.unwrap_or_default());
        Ok(match token {
            Some(credential) => base.with_bearer_token(credential),
            None => base,
        })
    }

    /// Persists and publishes one discovered tool, undoing the row when
    /// publication fails. Returns the skip reason on failure.
    async fn admit_tool(
        &self,
        server: &McpServer,
        tool: &BackendTool,
    ) -> Result<PublicToolName, String> {
        let skip = |stage: &str, reason: String| {
            warn!(server = %server.name(), tool = %tool.name, stage, %reason, "skipping tool");
            reason
        };

        let definition = to_definition(tool).map_err(|err| skip("validate", err.to_string()))?;
        let record = McpToolRecord::new(server.id(), definition.clone(), &*self.clock);
        self.repository
            .add_tool(&record)
            .await
            .map_err(|err| skip("persist", err.to_string()))?;

        let entry = CatalogEntry::new(server.id(), server.name().clone(), definition);
        let public_name = entry.public_name().clone();
        if let Err(err) = self.catalog.publish(entry) {
            if let Err(undo) = self.repository.remove_tool(server.id(), record.name()).await {
                warn!(
                    server = %server.name(),
                    tool = %record.name(),
                    error = %undo,
                    "failed to remove tool row after publish failure"
                );
            }
            return Err(skip("publish", err.to_string()));
        }
        Ok(public_name)
    }

    async fn evict(&self, name: McpServerName) -> McpGatewayResult<()> {
        let _lock = self.locks.acquire(&name).await;
        let server = self
            .repository
            .find_by_name(&name)
            .await?
            .ok_or_else(|| McpGatewayError::ServerNotFound(name.clone()))?;

        let entries = self.catalog.list_by_server(&name)?;
        let mut records: HashMap<String, McpToolRecord> = self
            .repository
            .list_tools(server.id())
            .await?
            .into_iter()
            .map(|record| (record.name().to_owned(), record))
            .collect();

        let mut removed = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = records.remove(entry.tool_name());
            match self.remove_tool(&server, entry, record).await {
                Ok(done) => removed.push(done),
                Err(err) => {
                    self.restore_tools(&server, removed).await;
                    return Err(McpGatewayError::EvictionAborted {
                        server: name,
                        source: Box::new(err),
                    });
                }
            }
        }

        match self.repository.remove(&name).await {
            Ok(()) => {}
            Err(McpServerRegistryError::ServerNotFound(_)) => {
                return Err(McpGatewayError::ServerNotFound(name));
            }
            Err(err) => {
                self.restore_tools(&server, removed).await;
                return Err(McpGatewayError::EvictionAborted {
                    server: name,
                    source: Box::new(err.into()),
                });
            }
        }

        self.connections.close(&name).await;
        info!(server = %name, tools = removed.len(), "deregistered MCP server");
        Ok(())
    }

    /// Retracts one entry and deletes its row. On failure the entry is put
    /// back before returning.
    async fn remove_tool(
        &self,
        server: &McpServer,
        entry: CatalogEntry,
        record: Option<McpToolRecord>,
    ) -> McpGatewayResult<RemovedTool> {
        self.catalog.retract(entry.public_name().as_str())?;

        match self.repository.remove_tool(server.id(), entry.tool_name()).await {
            Ok(()) | Err(McpServerRegistryError::ToolNotFound { .. }) => {
                Ok(RemovedTool { entry, record })
            }
            Err(err) => {
                if let Err(republish) = self.catalog.publish(entry) {
                    warn!(
                        server = %server.name(),
                        error = %republish,
                        "failed to restore catalog entry"
                    );
                }
                Err(err.into())
            }
        }
    }

    async fn restore_tools(&self, server: &McpServer, removed: Vec<RemovedTool>) {
        for RemovedTool { entry, record } in removed.into_iter().rev() {
            if let Some(row) = record
                && let Err(err) = self.repository.add_tool(&row).await
            {
                warn!(
                    server = %server.name(),
                    tool = %row.name(),
                    error = %err,
                    "failed to restore tool row during eviction rollback"
                );
            }
            if let Err(err) = self.catalog.publish(entry) {
                warn!(server = %server.name(), error = %err, "failed to restore catalog entry");
            }
        }
    }

    /// Re-discovers a server's tools, publishing new ones and retracting
    /// vanished ones. Both directions are best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`McpGatewayError::ServerNotFound`] for unknown servers and a
    /// transport/protocol error when the backend cannot be listed.
    pub async fn refresh_tools(&self, server_name: &str) -> McpGatewayResult<ToolRefresh> {
        let name = McpServerName::new(server_name)?;
        let _lock = self.locks.acquire(&name).await;
        let server = self.find_server(name.as_str()).await?;

        let session = self
            .connections
            .session_for(&server)
            .await
            .map_err(|err| McpGatewayError::backend(name.clone(), err))?;
        let discovered = self
            .connections
            .rediscover(&name, &session)
            .await
            .map_err(|err| McpGatewayError::backend(name.clone(), err))?;

        let offered: BTreeSet<String> = discovered.iter().map(|tool| tool.name.clone()).collect();
        let published = self.catalog.list_by_server(&name)?;
        let known: BTreeSet<String> = published
            .iter()
            .map(|entry| entry.tool_name().to_owned())
            .collect();

        let mut refresh = ToolRefresh::default();
        for tool in discovered.iter().filter(|tool| !known.contains(&tool.name)) {
            match self.admit_tool(&server, tool).await {
                Ok(public_name) => refresh.added.push(public_name),
                Err(reason) => refresh.skipped.push(SkippedTool {
                    tool_name: tool.name.clone(),
                    reason,
                }),
            }
        }

        for entry in published {
            if offered.contains(entry.tool_name()) {
                continue;
            }
            let public_name = entry.public_name().clone();
            let tool_name = entry.tool_name().to_owned();
            match self.remove_tool(&server, entry, None).await {
                Ok(_) => refresh.removed.push(public_name),
                Err(err) => {
                    warn!(
                        server = %name,
                        tool = %tool_name,
                        error = %err,
                        "failed to retract vanished tool"
                    );
                    refresh.skipped.push(SkippedTool {
                        tool_name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            server = %name,
            added = refresh.added.len(),
            removed = refresh.removed.len(),
            skipped = refresh.skipped.len(),
            "refreshed MCP server tools"
        );
        Ok(refresh)
    }

    /// Rebuilds the catalog from persisted tool rows without network I/O.
    ///
    /// Sessions open lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn restore(&self) -> McpGatewayResult<CatalogRestore> {
        let mut summary = CatalogRestore::default();
        for server in self.repository.list_all().await? {
            summary.servers += 1;
            for record in self.repository.list_tools(server.id()).await? {
                let entry = CatalogEntry::new(
                    server.id(),
                    server.name().clone(),
                    record.definition().clone(),
                );
                match self.catalog.publish(entry) {
                    Ok(()) => summary.tools += 1,
                    Err(err) => warn!(
                        server = %server.name(),
                        tool = %record.name(),
                        error = %err,
                        "skipping tool during restore"
                    ),
                }
            }
        }
        info!(servers = summary.servers, tools = summary.tools, "restored tool catalog");
        Ok(summary)
    }

    /// Lists every registered server ordered by name.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn list_servers(&self) -> McpGatewayResult<Vec<McpServer>> {
        Ok(self.repository.list_all().await?)
    }

    /// Finds a registered server by name.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed names and
    /// [`McpGatewayError::ServerNotFound`] when absent.
    pub async fn find_server(&self, server_name: &str) -> McpGatewayResult<McpServer> {
        let name = McpServerName::new(server_name)?;
        self.repository
            .find_by_name(&name)
            .await?
            .ok_or(McpGatewayError::ServerNotFound(name))
    }

    /// Lists published tools, optionally restricted to one server.
    ///
    /// # Errors
    ///
    /// Returns [`McpGatewayError::ServerNotFound`] when the filter names an
    /// unknown server.
    pub async fn list_tools(
        &self,
        server_name: Option<&str>,
    ) -> McpGatewayResult<Vec<CatalogEntry>> {
        match server_name {
            Some(raw) => {
                let server = self.find_server(raw).await?;
                Ok(self.catalog.list_by_server(server.name())?)
            }
            None => Ok(self.catalog.list_all()?),
        }
    }
}

fn to_definition(tool: &BackendTool) -> Result<McpToolDefinition, McpGatewayError> {
    let base = McpToolDefinition::new(
        tool.name.as_str(),
        tool.description.clone().unwrap_or_default(),
        tool.input_schema.clone(),
    )?;
    Ok(match &tool.output_schema {
        Some(schema) => base.with_output_schema(schema.clone()),
        None => base,
    })
}
