//! Routing of calls on public names to the owning backend.

use super::helpers::{
    FlakyGateway, Gateway, endpoint_for, flaky_gateway, gateway, server_name,
};
use junction::tool_registry::{
    domain::McpServerName,
    ports::McpBackendError,
    services::{GatewayErrorKind, McpGatewayError},
};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn call_reaches_the_owning_backend_unchanged(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway.serve("math", &["add"]);
    let literal = json!({"content": [{"type": "text", "text": "5"}], "isError": false});
    gateway
        .backend
        .respond_with(&endpoint_for("calc"), "add", literal.clone());
    gateway.admit("calc").await;
    gateway.admit("math").await;

    let result = gateway
        .router
        .invoke("calc/add", json!({"a": 2, "b": 3}).as_object().cloned())
        .await
        .expect("invocation should succeed");

    assert_eq!(result, literal);
    let calls = gateway.backend.calls();
    assert_eq!(calls.len(), 1);
    let call = calls.first().expect("one call");
    assert_eq!(call.endpoint, endpoint_for("calc"));
    assert_eq!(call.tool_name, "add");
    assert_eq!(call.arguments, json!({"a": 2, "b": 3}).as_object().cloned());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_public_name_makes_no_network_call(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway.admit("calc").await;
    let before = gateway.backend.network_interactions();

    let err = gateway
        .router
        .invoke("calc/divide", None)
        .await
        .expect_err("unknown tool should fail");

    assert!(matches!(err, McpGatewayError::ToolNotFound(ref name) if name == "calc/divide"));
    assert_eq!(gateway.backend.network_interactions(), before);
    assert!(gateway.recorder.events().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backend_failure_names_the_server(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway.admit("calc").await;
    gateway.backend.fail_calls(
        &endpoint_for("calc"),
        "add",
        McpBackendError::transport_message("connection reset"),
    );

    let err = gateway
        .router
        .invoke("calc/add", None)
        .await
        .expect_err("invocation should fail");

    assert_eq!(err.kind(), GatewayErrorKind::Invocation);
    assert_eq!(err.server().map(McpServerName::as_str), Some("calc"));
    assert!(err.to_string().contains("connection reset"));
    assert!(
        !gateway.connections.is_connected(&server_name("calc")),
        "a broken session is dropped"
    );
    let events = gateway.recorder.events();
    let event = events.first().expect("one event");
    assert!(!event.outcome.is_success());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn warm_registry_with_cold_connections_opens_lazily(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway
        .backend
        .respond_with(&endpoint_for("calc"), "add", json!({"sum": 5}));
    gateway.admit("calc").await;

    let restarted = Gateway::over(
        Arc::clone(&gateway.registry),
        Arc::clone(&gateway.backend),
    );
    restarted
        .lifecycle
        .restore()
        .await
        .expect("restore should succeed");
    assert!(!restarted.connections.is_connected(&server_name("calc")));

    let result = restarted
        .router
        .invoke("calc/add", None)
        .await
        .expect("invocation should succeed");

    assert_eq!(result, json!({"sum": 5}));
    assert!(restarted.connections.is_connected(&server_name("calc")));
    assert_eq!(gateway.backend.open_count(&endpoint_for("calc")), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lazy_open_racing_an_eviction_keeps_no_session(flaky_gateway: FlakyGateway) {
    let FlakyGateway { gateway, registry } = flaky_gateway;
    gateway.serve("calc", &["add"]);
    gateway.admit("calc").await;
    let restarted = Gateway::over(
        Arc::clone(&gateway.registry),
        Arc::clone(&gateway.backend),
    );
    restarted
        .lifecycle
        .restore()
        .await
        .expect("restore should succeed");
    registry.evict_after_next_lookup();

    let err = restarted
        .router
        .invoke("calc/add", None)
        .await
        .expect_err("server vanished during the open");

    assert_eq!(err.kind(), GatewayErrorKind::NotFound);
    assert!(!restarted.connections.is_connected(&server_name("calc")));
    assert_eq!(gateway.backend.open_count(&endpoint_for("calc")), 2);
    assert_eq!(gateway.backend.closed_sessions(), 1);
    assert!(gateway.backend.calls().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_calls_are_recorded(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway.admit("calc").await;

    gateway
        .router
        .invoke("calc/add", None)
        .await
        .expect("invocation should succeed");

    let events = gateway.recorder.events();
    let event = events.first().expect("one event");
    assert_eq!(event.public_name.as_str(), "calc/add");
    assert_eq!(event.server.as_str(), "calc");
    assert_eq!(event.tool, "add");
    assert!(event.outcome.is_success());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_calls_share_one_session(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway.admit("calc").await;

    let (first, second, third) = tokio::join!(
        gateway.router.invoke("calc/add", None),
        gateway.router.invoke("calc/add", None),
        gateway.router.invoke("calc/add", None),
    );

    assert!(first.is_ok() && second.is_ok() && third.is_ok());
    assert_eq!(gateway.backend.open_count(&endpoint_for("calc")), 1);
    assert_eq!(gateway.backend.calls().len(), 3);
}
