//! Scriptable in-memory backend connector.
//!
//! Backends are keyed by endpoint. Each one serves a tool list, canned
//! per-tool responses, and optional injected failures or latency. Every
//! session open and tool call is recorded so tests can assert on network
//! traffic without a network.

use crate::tool_registry::{
    domain::{McpEndpoint, McpServer},
    ports::{
        BackendTool, McpBackendConnector, McpBackendError, McpBackendResult, McpBackendSession,
        ToolArguments,
    },
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// A tool call observed by the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Endpoint the call was sent to.
    pub endpoint: McpEndpoint,
    /// Original tool name.
    pub tool_name: String,
    /// Arguments as received.
    pub arguments: Option<ToolArguments>,
}

/// In-memory implementation of [`McpBackendConnector`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryMcpBackend {
    state: Arc<RwLock<BackendState>>,
}

#[derive(Debug, Default)]
struct BackendState {
    servers: HashMap<McpEndpoint, ScriptedServer>,
    opens: Vec<McpEndpoint>,
    calls: Vec<RecordedCall>,
    closed_sessions: usize,
}

#[derive(Debug, Clone, Default)]
struct ScriptedServer {
    tools: Vec<BackendTool>,
    responses: HashMap<String, Value>,
    call_failures: HashMap<String, McpBackendError>,
    listing_failure: Option<McpBackendError>,
    latency: Option<Duration>,
    unreachable: bool,
}

impl InMemoryMcpBackend {
    /// Creates a backend with no reachable endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BackendState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BackendState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn script(&self, endpoint: &McpEndpoint, update: impl FnOnce(&mut ScriptedServer)) {
        let mut state = self.write();
        update(state.servers.entry(endpoint.clone()).or_default());
    }

    /// Makes `endpoint` reachable and serving `tools`.
    ///
    /// Calling this again replaces the tool list and clears an earlier
    /// [`Self::set_unreachable`].
    pub fn serve(&self, endpoint: &McpEndpoint, tools: Vec<BackendTool>) {
        self.script(endpoint, |server| {
            server.tools = tools;
            server.unreachable = false;
        });
    }

    /// Sets the literal result returned for calls to `tool_name`.
    pub fn respond_with(&self, endpoint: &McpEndpoint, tool_name: &str, response: Value) {
        self.script(endpoint, |server| {
            server.responses.insert(tool_name.to_owned(), response);
        });
    }

    /// Makes every call to `tool_name` fail with `error`.
    pub fn fail_calls(&self, endpoint: &McpEndpoint, tool_name: &str, error: McpBackendError) {
        self.script(endpoint, |server| {
            server.call_failures.insert(tool_name.to_owned(), error);
        });
    }

    /// Makes tool listing fail with `error`.
    pub fn fail_listing(&self, endpoint: &McpEndpoint, error: McpBackendError) {
        self.script(endpoint, |server| server.listing_failure = Some(error));
    }

    /// Delays every listing and call on `endpoint`.
    pub fn set_latency(&self, endpoint: &McpEndpoint, latency: Duration) {
        self.script(endpoint, |server| server.latency = Some(latency));
    }

    /// Makes `endpoint` refuse new sessions and fail calls on existing ones.
    pub fn set_unreachable(&self, endpoint: &McpEndpoint) {
        self.script(endpoint, |server| server.unreachable = true);
    }

    /// Returns how many sessions were opened to `endpoint`.
    #[must_use]
    pub fn open_count(&self, endpoint: &McpEndpoint) -> usize {
        self.read()
            .opens
            .iter()
            .filter(|opened| *opened == endpoint)
            .count()
    }

    /// Returns every recorded tool call in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.read().calls.clone()
    }

    /// Returns the total number of network interactions (opens and calls).
    #[must_use]
    pub fn network_interactions(&self) -> usize {
        let state = self.read();
        state.opens.len() + state.calls.len()
    }

    /// Returns how many sessions have been closed.
    #[must_use]
    pub fn closed_sessions(&self) -> usize {
        self.read().closed_sessions
    }

    fn reachable_script(&self, endpoint: &McpEndpoint) -> McpBackendResult<ScriptedServer> {
        match self.read().servers.get(endpoint) {
            Some(server) if !server.unreachable => Ok(server.clone()),
            _ => Err(McpBackendError::transport_message(format!(
                "connection refused by {endpoint}"
            ))),
        }
    }
}

#[async_trait]
impl McpBackendConnector for InMemoryMcpBackend {
    async fn open(&self, server: &McpServer) -> McpBackendResult<Arc<dyn McpBackendSession>> {
        let endpoint = server.endpoint().clone();
        self.write().opens.push(endpoint.clone());
        self.reachable_script(&endpoint)?;

        Ok(Arc::new(InMemorySession {
            backend: self.clone(),
            endpoint,
            closed: AtomicBool::new(false),
        }))
    }
}

struct InMemorySession {
    backend: InMemoryMcpBackend,
    endpoint: McpEndpoint,
    closed: AtomicBool,
}

impl InMemorySession {
    fn ensure_open(&self) -> McpBackendResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(McpBackendError::SessionClosed);
        }
        Ok(())
    }
}

async fn simulate_latency(script: &ScriptedServer) {
    if let Some(latency) = script.latency {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl McpBackendSession for InMemorySession {
    async fn list_tools(&self) -> McpBackendResult<Vec<BackendTool>> {
        self.ensure_open()?;
        let script = self.backend.reachable_script(&self.endpoint)?;
        simulate_latency(&script).await;

        if let Some(error) = script.listing_failure {
            return Err(error);
        }
        Ok(script.tools)
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Option<ToolArguments>,
    ) -> McpBackendResult<Value> {
        self.ensure_open()?;
        self.backend.write().calls.push(RecordedCall {
            endpoint: self.endpoint.clone(),
            tool_name: tool_name.to_owned(),
            arguments: arguments.clone(),
        });
        let script = self.backend.reachable_script(&self.endpoint)?;
        simulate_latency(&script).await;

        if let Some(error) = script.call_failures.get(tool_name) {
            return Err(error.clone());
        }
        if let Some(response) = script.responses.get(tool_name) {
            return Ok(response.clone());
        }
        if script.tools.iter().any(|tool| tool.name == tool_name) {
            return Ok(json!({ "tool": tool_name, "arguments": arguments }));
        }
        Err(McpBackendError::protocol_message(format!(
            "unknown tool '{tool_name}'"
        )))
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.backend.write().closed_sessions += 1;
        }
    }
}
