//! Runs the Junction gateway.
//!
//! Configuration comes from the environment (see [`junction::config`]).
//! With `DATABASE_URL` set the registry lives in `PostgreSQL`; otherwise it is
//! held in memory and lost on exit. Persisted tools are republished at start
//! and backend sessions open on first use.

use junction::{
    config::GatewayConfig,
    http::{AppState, build_router},
    telemetry,
    tool_registry::{
        adapters::{
            StreamableHttpConnector, TracingInvocationRecorder, memory::InMemoryMcpServerRegistry,
            postgres::PostgresMcpServerRegistry,
        },
        ports::McpServerRegistryRepository,
    },
};
use std::sync::Arc;
use tracing::{info, warn};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    telemetry::init_logging();

    let config = GatewayConfig::from_env()?;
    let repository = open_registry(&config).await?;
    let state = AppState::assemble(
        repository,
        Arc::new(StreamableHttpConnector::new(config.backend_timeout)),
        Arc::new(TracingInvocationRecorder),
        config.backend_timeout,
    );

    state.lifecycle.restore().await?;

    let connections = Arc::clone(&state.connections);
    let bind_socket = config.bind_socket()?;
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;
    info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "gateway starting"
    );

    axum::serve(listener, build_router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    connections.close_all().await;
    info!("gateway stopped");
    Ok(())
}

async fn open_registry(
    config: &GatewayConfig,
) -> Result<Arc<dyn McpServerRegistryRepository>, BoxError> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL is not set; registrations will not survive a restart");
        return Ok(Arc::new(InMemoryMcpServerRegistry::new()));
    };

    let registry = PostgresMcpServerRegistry::connect(database_url, config.database_pool_size)?;
    registry.ensure_schema().await?;
    info!("using PostgreSQL server registry");
    Ok(Arc::new(registry))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
