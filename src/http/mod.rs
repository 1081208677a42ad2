//! HTTP surface: the admin API under `/api/v0` and the aggregated MCP
//! endpoint at `/mcp`.

mod errors;
mod handlers;
mod mcp;

pub use errors::{AppError, ErrorResponse, status_for};
pub use handlers::{InvokeToolRequest, ToolSummary};

use crate::telemetry::request_logging_middleware;
use crate::tool_registry::{
    ports::{InvocationRecorder, McpBackendConnector, McpServerRegistryRepository},
    services::{
        McpConnectionManager, McpInvocationRouter, McpServerLifecycleService, ToolCatalog,
    },
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use mockable::DefaultClock;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle service over type-erased registry and connector.
pub type GatewayLifecycle = McpServerLifecycleService<
    dyn McpServerRegistryRepository,
    dyn McpBackendConnector,
    DefaultClock,
>;

/// Invocation router over type-erased registry and connector.
pub type GatewayRouter =
    McpInvocationRouter<dyn McpServerRegistryRepository, dyn McpBackendConnector, DefaultClock>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Admission, eviction, and listing.
    pub lifecycle: Arc<GatewayLifecycle>,
    /// Routed tool calls.
    pub router: Arc<GatewayRouter>,
    /// Published tools.
    pub catalog: Arc<ToolCatalog>,
    /// Live connections, closed on shutdown.
    pub connections: Arc<McpConnectionManager<dyn McpBackendConnector>>,
}

impl AppState {
    /// Wires the catalog, connection manager, orchestrator, and router over
    /// the given adapters.
    #[must_use]
    pub fn assemble(
        repository: Arc<dyn McpServerRegistryRepository>,
        connector: Arc<dyn McpBackendConnector>,
        recorder: Arc<dyn InvocationRecorder>,
        backend_timeout: Duration,
    ) -> Self {
        let clock = Arc::new(DefaultClock);
        let catalog = Arc::new(ToolCatalog::new());
        let connections = Arc::new(McpConnectionManager::new(connector, backend_timeout));
        let lifecycle = McpServerLifecycleService::new(
            Arc::clone(&repository),
            Arc::clone(&catalog),
            Arc::clone(&connections),
            Arc::clone(&clock),
        );
        let router = McpInvocationRouter::new(
            repository,
            Arc::clone(&catalog),
            Arc::clone(&connections),
            recorder,
            clock,
        );
        Self {
            lifecycle: Arc::new(lifecycle),
            router: Arc::new(router),
            catalog,
            connections,
        }
    }
}

/// Builds the application router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/servers",
            post(handlers::register_server).get(handlers::list_servers),
        )
        .route(
            "/servers/{name}",
            get(handlers::get_server).delete(handlers::deregister_server),
        )
        .route("/servers/{name}/refresh", post(handlers::refresh_server))
        .route("/tools", get(handlers::list_tools))
        .route("/tools/invoke", post(handlers::invoke_tool));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/mcp", post(mcp::mcp_endpoint))
        .nest("/api/v0", admin)
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}
