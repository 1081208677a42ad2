//! Connection manager owning one live backend session per server.

use crate::tool_registry::{
    domain::{McpServer, McpServerName},
    ports::{
        BackendTool, McpBackendConnector, McpBackendError, McpBackendResult, McpBackendSession,
        ToolArguments,
    },
};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, warn};

type SharedSession = Arc<dyn McpBackendSession>;

/// Opens, shares, and closes backend sessions.
///
/// Every backend call is bounded by the configured timeout. Sessions are
/// shared by concurrent callers; the manager never serialises calls to the
/// same backend.
pub struct McpConnectionManager<K>
where
    K: McpBackendConnector + ?Sized,
{
    connector: Arc<K>,
    sessions: RwLock<HashMap<McpServerName, SharedSession>>,
    timeout: Duration,
}

impl<K> McpConnectionManager<K>
where
    K: McpBackendConnector + ?Sized,
{
    /// Creates a manager opening sessions through `connector`.
    #[must_use]
    pub fn new(connector: Arc<K>, timeout: Duration) -> Self {
        Self {
            connector,
            sessions: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Returns the bound applied to every backend call.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn read_sessions(&self) -> RwLockReadGuard<'_, HashMap<McpServerName, SharedSession>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_sessions(&self) -> RwLockWriteGuard<'_, HashMap<McpServerName, SharedSession>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = McpBackendResult<T>> + Send,
    ) -> McpBackendResult<T> {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| McpBackendError::Timeout(self.timeout))?
    }

    /// Opens a fresh session to `server` without attaching it.
    ///
    /// # Errors
    ///
    /// Returns the connector's failure, or [`McpBackendError::Timeout`].
    pub async fn open(&self, server: &McpServer) -> McpBackendResult<SharedSession> {
        self.bounded(self.connector.open(server)).await
    }

    /// Lists the tools currently offered through `session`.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, or [`McpBackendError::Timeout`].
    pub async fn list_tools(&self, session: &SharedSession) -> McpBackendResult<Vec<BackendTool>> {
        self.bounded(session.list_tools()).await
    }

    /// Forwards one call through the session held for `server_name`.
    ///
    /// A transport-class failure evicts that session so the next call opens a
    /// new one.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, or [`McpBackendError::Timeout`].
    pub async fn invoke(
        &self,
        server_name: &McpServerName,
        session: &SharedSession,
        tool_name: &str,
        arguments: Option<ToolArguments>,
    ) -> McpBackendResult<Value> {
        let result = self
            .bounded(session.call_tool(tool_name, arguments))
            .await;
        if let Err(err) = &result
            && err.is_transport()
        {
            self.evict_broken(server_name, session, err).await;
        }
        result
    }

    /// Refreshes the tool list through `session`, evicting it on transport
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, or [`McpBackendError::Timeout`].
    pub async fn rediscover(
        &self,
        server_name: &McpServerName,
        session: &SharedSession,
    ) -> McpBackendResult<Vec<BackendTool>> {
        let result = self.list_tools(session).await;
        if let Err(err) = &result
            && err.is_transport()
        {
            self.evict_broken(server_name, session, err).await;
        }
        result
    }

    async fn evict_broken(
        &self,
        server_name: &McpServerName,
        session: &SharedSession,
        err: &McpBackendError,
    ) {
        if self.release(server_name, session).await {
            warn!(server = %server_name, error = %err, "evicted broken MCP session");
        }
    }

    /// Closes `session` and forgets it, but only while it is still the one
    /// held for `server_name`. Returns whether it was released.
    pub async fn release(&self, server_name: &McpServerName, session: &SharedSession) -> bool {
        let released = {
            let mut sessions = self.write_sessions();
            let is_current = sessions
                .get(server_name)
                .is_some_and(|held| Arc::ptr_eq(held, session));
            if is_current {
                sessions.remove(server_name)
            } else {
                None
            }
        };
        match released {
            Some(current) => {
                current.close().await;
                true
            }
            None => false,
        }
    }

    /// Holds `session` as the live session for `server_name`.
    ///
    /// A previously held session is closed.
    pub async fn attach(&self, server_name: McpServerName, session: SharedSession) {
        let previous = self.write_sessions().insert(server_name, session);
        if let Some(stale) = previous {
            stale.close().await;
        }
    }

    /// Returns the held session for `server_name`, if any.
    #[must_use]
    pub fn held(&self, server_name: &McpServerName) -> Option<SharedSession> {
        self.read_sessions().get(server_name).cloned()
    }

    /// Returns whether a session is held for `server_name`.
    #[must_use]
    pub fn is_connected(&self, server_name: &McpServerName) -> bool {
        self.read_sessions().contains_key(server_name)
    }

    /// Returns the held session for `server`, opening and attaching one when
    /// none is held.
    ///
    /// When two callers race to open, one session is kept and the other is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns the connector's failure, or [`McpBackendError::Timeout`].
    pub async fn session_for(&self, server: &McpServer) -> McpBackendResult<SharedSession> {
        if let Some(session) = self.held(server.name()) {
            return Ok(session);
        }

        let opened = self.open(server).await?;
        debug!(server = %server.name(), "opened MCP session on demand");

        let (kept, loser) = {
            let mut sessions = self.write_sessions();
            match sessions.get(server.name()).cloned() {
                Some(existing) => (existing, Some(opened)),
                None => {
                    sessions.insert(server.name().clone(), Arc::clone(&opened));
                    (opened, None)
                }
            }
        };
        if let Some(duplicate) = loser {
            duplicate.close().await;
        }
        Ok(kept)
    }

    /// Closes and forgets the session for `server_name`. Harmless when none is
    /// held.
    pub async fn close(&self, server_name: &McpServerName) {
        let removed = self.write_sessions().remove(server_name);
        if let Some(session) = removed {
            session.close().await;
        }
    }

    /// Closes every held session.
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.write_sessions().drain().collect();
        for (server_name, session) in drained {
            debug!(server = %server_name, "closing MCP session");
            session.close().await;
        }
    }
}
