//! Routes calls on public tool names to the owning backend.

use super::{
    catalog::{CatalogEntry, ToolCatalog},
    connections::McpConnectionManager,
    error::{McpGatewayError, McpGatewayResult},
};
use crate::tool_registry::{
    domain::McpServer,
    ports::{
        InvocationEvent, InvocationOutcome, InvocationRecorder, McpBackendConnector,
        McpBackendSession, McpServerRegistryRepository, ToolArguments,
    },
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Resolves public tool names against the catalog and forwards each call
/// through the connection manager.
///
/// Arguments are not validated; the backend enforces its own schema.
pub struct McpInvocationRouter<R, K, C>
where
    R: McpServerRegistryRepository + ?Sized,
    K: McpBackendConnector + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    catalog: Arc<ToolCatalog>,
    connections: Arc<McpConnectionManager<K>>,
    recorder: Arc<dyn InvocationRecorder>,
    clock: Arc<C>,
}

impl<R, K, C> McpInvocationRouter<R, K, C>
where
    R: McpServerRegistryRepository + ?Sized,
    K: McpBackendConnector + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a router.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        catalog: Arc<ToolCatalog>,
        connections: Arc<McpConnectionManager<K>>,
        recorder: Arc<dyn InvocationRecorder>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            catalog,
            connections,
            recorder,
            clock,
        }
    }

    /// Invokes the tool published as `public_name`.
    ///
    /// The backend result is returned unchanged. Every call that reaches the
    /// backend is reported to the invocation recorder.
    ///
    /// # Errors
    ///
    /// Returns [`McpGatewayError::ToolNotFound`] without any network call when
    /// nothing is published under `public_name`, and
    /// [`McpGatewayError::Invocation`] naming the owning server when the
    /// backend call fails.
    pub async fn invoke(
        &self,
        public_name: &str,
        arguments: Option<ToolArguments>,
    ) -> McpGatewayResult<Value> {
        let entry = self.catalog.lookup(public_name)?;

        let started = Instant::now();
        let result = self.forward(&entry, arguments).await;
        let outcome = match &result {
            Ok(_) => InvocationOutcome::Success,
            Err(err) => InvocationOutcome::Failure {
                message: err.to_string(),
            },
        };
        self.recorder.record(InvocationEvent {
            public_name: entry.public_name().clone(),
            server: entry.server_name().clone(),
            tool: entry.tool_name().to_owned(),
            outcome,
            duration: started.elapsed(),
            completed_at: self.clock.utc(),
        });
        result
    }

    async fn forward(
        &self,
        entry: &CatalogEntry,
        arguments: Option<ToolArguments>,
    ) -> McpGatewayResult<Value> {
        let server_name = entry.server_name();
        let invocation_error = |source| McpGatewayError::Invocation {
            server: server_name.clone(),
            tool: entry.tool_name().to_owned(),
            source,
        };

        let session = if let Some(held) = self.connections.held(server_name) {
            held
        } else {
            let server = self
                .repository
                .find_by_name(server_name)
                .await?
                .ok_or_else(|| McpGatewayError::ServerNotFound(server_name.clone()))?;
            let opened = self
                .connections
                .session_for(&server)
                .await
                .map_err(invocation_error)?;
            self.confirm_registered(&server, &opened).await?;
            opened
        };

        self.connections
            .invoke(server_name, &session, entry.tool_name(), arguments)
            .await
            .map_err(invocation_error)
    }

    /// Re-reads the registry after a lazy open. An eviction that finished
    /// while the session was opening has already closed its sessions, so the
    /// one just attached is released here instead.
    async fn confirm_registered(
        &self,
        server: &McpServer,
        session: &Arc<dyn McpBackendSession>,
    ) -> McpGatewayResult<()> {
        match self.repository.find_by_name(server.name()).await? {
            Some(current) if current.id() == server.id() => Ok(()),
            Some(_) => Err(McpGatewayError::ServerNotFound(server.name().clone())),
            None => {
                self.connections.release(server.name(), session).await;
                Err(McpGatewayError::ServerNotFound(server.name().clone()))
            }
        }
    }
}
