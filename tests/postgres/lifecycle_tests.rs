//! Admission, eviction, and restart over a persisted registry.

use super::helpers::{TestDatabase, database};
use junction::tool_registry::{
    adapters::{memory::InMemoryMcpBackend, postgres::PostgresMcpServerRegistry},
    domain::{McpEndpoint, McpServerName},
    ports::{BackendTool, McpServerRegistryRepository},
    services::{
        GatewayErrorKind, McpConnectionManager, McpServerLifecycleService,
        RegisterMcpServerRequest, ToolCatalog,
    },
};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

type PgLifecycle =
    McpServerLifecycleService<PostgresMcpServerRegistry, InMemoryMcpBackend, DefaultClock>;

const ENDPOINT: &str = "http://calc.test/mcp";

fn lifecycle_over(
    registry: &Arc<PostgresMcpServerRegistry>,
    backend: &Arc<InMemoryMcpBackend>,
) -> (PgLifecycle, Arc<ToolCatalog>) {
    let catalog = Arc::new(ToolCatalog::new());
    let connections = Arc::new(McpConnectionManager::new(
        Arc::clone(backend),
        Duration::from_millis(500),
    ));
    let lifecycle = McpServerLifecycleService::new(
        Arc::clone(registry),
        Arc::clone(&catalog),
        connections,
        Arc::new(DefaultClock),
    );
    (lifecycle, catalog)
}

fn calc_backend() -> Arc<InMemoryMcpBackend> {
    let backend = Arc::new(InMemoryMcpBackend::new());
    backend.serve(
        &McpEndpoint::parse(ENDPOINT).expect("valid endpoint"),
        vec![BackendTool::named("add"), BackendTool::named("subtract")],
    );
    backend
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn admitted_tools_survive_a_restart(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let registry = Arc::new(db.registry.clone());
    let backend = calc_backend();
    let (lifecycle, _) = lifecycle_over(&registry, &backend);

    lifecycle
        .register(RegisterMcpServerRequest::new("calc", ENDPOINT))
        .await
        .expect("admission should succeed");

    let (restarted, catalog) = lifecycle_over(&registry, &backend);
    let restore = restarted.restore().await.expect("restore should succeed");

    assert_eq!(restore.servers, 1);
    assert_eq!(restore.tools, 2);
    let names: Vec<String> = catalog
        .list_all()
        .expect("catalog list")
        .iter()
        .map(|entry| entry.public_name().to_string())
        .collect();
    assert_eq!(names, ["calc/add", "calc/subtract"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn eviction_clears_every_persisted_row(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let registry = Arc::new(db.registry.clone());
    let backend = calc_backend();
    let (lifecycle, catalog) = lifecycle_over(&registry, &backend);
    let registration = lifecycle
        .register(RegisterMcpServerRequest::new("calc", ENDPOINT))
        .await
        .expect("admission should succeed");

    lifecycle.deregister("calc").await.expect("eviction should succeed");

    assert!(catalog.is_empty().expect("catalog size"));
    let name = McpServerName::new("calc").expect("valid server name");
    assert!(registry.find_by_name(&name).await.expect("lookup").is_none());
    assert!(
        registry
            .list_tools(registration.server.id())
            .await
            .expect("list rows")
            .is_empty()
    );
    let err = lifecycle
        .deregister("calc")
        .await
        .expect_err("second eviction should fail");
    assert_eq!(err.kind(), GatewayErrorKind::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_admission_is_a_conflict(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let registry = Arc::new(db.registry.clone());
    let backend = calc_backend();
    let (lifecycle, _) = lifecycle_over(&registry, &backend);
    lifecycle
        .register(RegisterMcpServerRequest::new("calc", ENDPOINT))
        .await
        .expect("first admission should succeed");

    let err = lifecycle
        .register(RegisterMcpServerRequest::new("calc", ENDPOINT))
        .await
        .expect_err("second admission should fail");

    assert_eq!(err.kind(), GatewayErrorKind::Conflict);
}
