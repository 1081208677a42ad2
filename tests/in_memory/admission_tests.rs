//! Admission: uniqueness, atomic connection checks, best-effort publication, and
//! concurrent independence.

use super::helpers::{
    FlakyGateway, Gateway, endpoint_for, flaky_gateway, gateway, request_for, server_name,
};
use junction::tool_registry::{
    domain::{McpServerId, McpServerName, McpToolDefinition, PublicToolName},
    ports::{BackendTool, McpBackendError},
    services::{CatalogEntry, GatewayErrorKind, McpGatewayError},
};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identically_named_tools_get_distinct_public_names(gateway: Gateway) {
    gateway.serve("alpha", &["query"]);
    gateway.serve("beta", &["query"]);

    gateway.admit("alpha").await;
    gateway.admit("beta").await;

    assert_eq!(gateway.public_names(), ["alpha/query", "beta/query"]);
    let alpha = gateway.catalog.lookup("alpha/query").expect("alpha entry");
    let beta = gateway.catalog.lookup("beta/query").expect("beta entry");
    assert_ne!(alpha.server_id(), beta.server_id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_server_name_is_a_conflict(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway.admit("calc").await;
    let opens_before = gateway.backend.open_count(&endpoint_for("calc"));

    let err = gateway
        .lifecycle
        .register(request_for("calc"))
        .await
        .expect_err("second registration should fail");

    assert!(matches!(err, McpGatewayError::DuplicateServer(ref name) if name.as_str() == "calc"));
    assert_eq!(err.kind(), GatewayErrorKind::Conflict);
    assert_eq!(
        gateway.backend.open_count(&endpoint_for("calc")),
        opens_before,
        "a known name is rejected before probing"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registry_rejects_a_name_taken_after_the_early_check(flaky_gateway: FlakyGateway) {
    let FlakyGateway { gateway, registry } = flaky_gateway;
    gateway.serve("calc", &["add"]);
    gateway.admit("calc").await;
    let winner = gateway
        .catalog
        .lookup("calc/add")
        .expect("winner entry")
        .server_id();
    registry.hide_next_lookup();

    let err = gateway
        .lifecycle
        .register(request_for("calc"))
        .await
        .expect_err("second admission should lose");

    assert_eq!(err.kind(), GatewayErrorKind::Conflict);
    assert_eq!(gateway.backend.open_count(&endpoint_for("calc")), 2);
    assert_eq!(gateway.backend.closed_sessions(), 1, "the losing session is closed");
    assert!(gateway.connections.is_connected(&server_name("calc")));
    assert_eq!(gateway.public_names(), ["calc/add"]);
    assert_eq!(
        gateway.catalog.lookup("calc/add").expect("entry").server_id(),
        winner
    );
    assert_eq!(
        gateway.persisted_tools("calc").await,
        Some(vec!["add".to_owned()])
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend_leaves_no_trace(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway.backend.set_unreachable(&endpoint_for("calc"));

    let err = gateway
        .lifecycle
        .register(request_for("calc"))
        .await
        .expect_err("admission should fail");

    assert_eq!(err.kind(), GatewayErrorKind::Transport);
    assert_eq!(err.server().map(McpServerName::as_str), Some("calc"));
    assert_eq!(gateway.persisted_tools("calc").await, None);
    assert!(gateway.public_names().is_empty());
    assert!(!gateway.connections.is_connected(&server_name("calc")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_tool_list_aborts_admission(gateway: Gateway) {
    gateway.serve("calc", &["add"]);
    gateway.backend.fail_listing(
        &endpoint_for("calc"),
        McpBackendError::protocol_message("tools/list returned garbage"),
    );

    let err = gateway
        .lifecycle
        .register(request_for("calc"))
        .await
        .expect_err("admission should fail");

    assert_eq!(err.kind(), GatewayErrorKind::Protocol);
    assert_eq!(gateway.persisted_tools("calc").await, None);
    assert!(gateway.public_names().is_empty());
    assert_eq!(gateway.backend.closed_sessions(), 1, "the opened session is closed");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publish_conflict_skips_only_that_tool(gateway: Gateway) {
    gateway.serve("calc", &["add", "subtract", "multiply"]);
    gateway
        .catalog
        .publish(CatalogEntry::new(
            McpServerId::new(),
            server_name("calc"),
            McpToolDefinition::new("subtract", "", json!({"type": "object"}))
                .expect("valid tool"),
        ))
        .expect("seed conflicting entry");

    let registration = gateway
        .lifecycle
        .register(request_for("calc"))
        .await
        .expect("admission should still succeed");

    let published: Vec<&str> = registration
        .published
        .iter()
        .map(PublicToolName::as_str)
        .collect();
    assert_eq!(published, ["calc/add", "calc/multiply"]);
    let skipped = registration.skipped.first().expect("one skipped tool");
    assert_eq!(skipped.tool_name, "subtract");
    assert_eq!(
        gateway.persisted_tools("calc").await,
        Some(vec!["add".to_owned(), "multiply".to_owned()]),
        "the row of an unpublished tool is removed again"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_tool_in_listing_is_skipped(gateway: Gateway) {
    gateway.backend.serve(
        &endpoint_for("calc"),
        vec![
            BackendTool::named("add"),
            BackendTool::named("add").with_description("shadow"),
            BackendTool::named("subtract"),
        ],
    );

    let registration = gateway
        .lifecycle
        .register(request_for("calc"))
        .await
        .expect("admission should still succeed");

    assert_eq!(registration.published.len(), 2);
    assert_eq!(registration.skipped.len(), 1);
    assert_eq!(gateway.public_names(), ["calc/add", "calc/subtract"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_admissions_do_not_interfere(gateway: Gateway) {
    gateway.serve("serverA", &["add"]);
    gateway.serve("serverB", &["add"]);
    gateway
        .backend
        .respond_with(&endpoint_for("serverA"), "add", json!({"from": "A"}));
    gateway
        .backend
        .respond_with(&endpoint_for("serverB"), "add", json!({"from": "B"}));

    let (first, second) = tokio::join!(
        gateway.lifecycle.register(request_for("serverA")),
        gateway.lifecycle.register(request_for("serverB")),
    );
    first.expect("serverA admission");
    second.expect("serverB admission");

    assert_eq!(gateway.public_names(), ["serverA/add", "serverB/add"]);
    let from_a = gateway
        .router
        .invoke("serverA/add", None)
        .await
        .expect("serverA call");
    let from_b = gateway
        .router
        .invoke("serverB/add", None)
        .await
        .expect("serverB call");
    assert_eq!(from_a, json!({"from": "A"}));
    assert_eq!(from_b, json!({"from": "B"}));
}
