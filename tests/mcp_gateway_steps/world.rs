//! Shared world state for MCP gateway BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use junction::tool_registry::{
    adapters::{
        TracingInvocationRecorder,
        memory::{InMemoryMcpBackend, InMemoryMcpServerRegistry},
    },
    domain::McpEndpoint,
    ports::{BackendTool, ToolArguments},
    services::{
        McpConnectionManager, McpGatewayResult, McpInvocationRouter, McpServerLifecycleService,
        RegisterMcpServerRequest, ServerRegistration, ToolCatalog,
    },
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};

/// Lifecycle service used by the BDD world.
pub type WorldLifecycle =
    McpServerLifecycleService<InMemoryMcpServerRegistry, InMemoryMcpBackend, DefaultClock>;

/// Router used by the BDD world.
pub type WorldRouter =
    McpInvocationRouter<InMemoryMcpServerRegistry, InMemoryMcpBackend, DefaultClock>;

/// Scenario world for gateway behaviour tests.
pub struct GatewayWorld {
    /// Persisted registry.
    pub registry: Arc<InMemoryMcpServerRegistry>,
    /// Scriptable backends.
    pub backend: Arc<InMemoryMcpBackend>,
    /// Published tools.
    pub catalog: Arc<ToolCatalog>,
    /// Admission and eviction.
    pub lifecycle: WorldLifecycle,
    /// Routed calls.
    pub router: WorldRouter,
    /// Literal result scripted for the backend under test.
    pub scripted_result: Option<Value>,
    /// Result of the last registration attempt.
    pub last_register_result: Option<McpGatewayResult<ServerRegistration>>,
    /// Result of the last invocation.
    pub last_invoke_result: Option<McpGatewayResult<Value>>,
}

impl GatewayWorld {
    /// Creates a world with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        let registry = Arc::new(InMemoryMcpServerRegistry::new());
        let backend = Arc::new(InMemoryMcpBackend::new());
        let clock = Arc::new(DefaultClock);
        let catalog = Arc::new(ToolCatalog::new());
        let connections = Arc::new(McpConnectionManager::new(
            Arc::clone(&backend),
            Duration::from_millis(500),
        ));
        let lifecycle = McpServerLifecycleService::new(
            Arc::clone(&registry),
            Arc::clone(&catalog),
            Arc::clone(&connections),
            Arc::clone(&clock),
        );
        let router = McpInvocationRouter::new(
            Arc::clone(&registry),
            Arc::clone(&catalog),
            connections,
            Arc::new(TracingInvocationRecorder),
            clock,
        );
        Self {
            registry,
            backend,
            catalog,
            lifecycle,
            router,
            scripted_result: None,
            last_register_result: None,
            last_invoke_result: None,
        }
    }

    /// Scripts the backend for `server` to offer `tools`.
    pub fn serve(&self, server: &str, tools: &str) -> Result<(), eyre::Report> {
        let endpoint = endpoint_for(server)?;
        self.backend.serve(
            &endpoint,
            split_list(tools).map(BackendTool::named).collect(),
        );
        Ok(())
    }
}

impl Default for GatewayWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> GatewayWorld {
    GatewayWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Returns the conventional endpoint for `server`.
pub fn endpoint_for(server: &str) -> Result<McpEndpoint, eyre::Report> {
    McpEndpoint::parse(format!("http://{server}.test/mcp"))
        .map_err(|err| eyre::eyre!("invalid endpoint for '{server}': {err}"))
}

/// Builds a registration request for `server`.
pub fn build_request(server: &str) -> Result<RegisterMcpServerRequest, eyre::Report> {
    let endpoint = endpoint_for(server)?;
    Ok(RegisterMcpServerRequest::new(server, endpoint.as_str()))
}

/// Splits a comma separated step argument.
pub fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// Builds the `{a, b}` argument object used by the calculator scenarios.
pub fn calculator_arguments(a: i64, b: i64) -> Option<ToolArguments> {
    json!({"a": a, "b": b}).as_object().cloned()
}

/// Renders the literal MCP text result a backend returns for `text`.
pub fn text_result(text: &str) -> Value {
    json!({"content": [{"type": "text", "text": text}], "isError": false})
}
