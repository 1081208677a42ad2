//! Constraint mapping and transactional behaviour of the `PostgreSQL` registry.

use super::helpers::{TestDatabase, database, server, tool};
use junction::tool_registry::{
    domain::McpServerId,
    ports::{McpServerRegistryError, McpServerRegistryRepository},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ensure_schema_is_idempotent(database: Option<TestDatabase>) {
    let Some(db) = database else { return };

    db.migrate().await;
    db.registry
        .ensure_schema()
        .await
        .expect("second schema pass should succeed");

    let servers = db.registry.list_all().await.expect("list servers");
    assert!(servers.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registered_server_round_trips(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let calc = server("calc");

    db.registry.register(&calc).await.expect("register calc");

    let found = db
        .registry
        .find_by_name(calc.name())
        .await
        .expect("lookup calc")
        .expect("calc is persisted");
    assert_eq!(found.id(), calc.id());
    assert_eq!(found.endpoint(), calc.endpoint());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_name_maps_to_duplicate_server_name(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    db.registry
        .register(&server("calc"))
        .await
        .expect("register first calc");

    let err = db
        .registry
        .register(&server("calc"))
        .await
        .expect_err("second calc should be rejected");

    assert!(
        matches!(err, McpServerRegistryError::DuplicateServerName(ref name) if name.as_str() == "calc"),
        "unexpected error: {err:?}"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_tool_maps_to_duplicate_tool(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let calc = server("calc");
    db.registry.register(&calc).await.expect("register calc");
    db.registry
        .add_tool(&tool(&calc, "add"))
        .await
        .expect("first add row");

    let err = db
        .registry
        .add_tool(&tool(&calc, "add"))
        .await
        .expect_err("second add row should be rejected");

    assert!(
        matches!(
            err,
            McpServerRegistryError::DuplicateTool { server_id, ref tool_name }
                if server_id == calc.id() && tool_name == "add"
        ),
        "unexpected error: {err:?}"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tool_for_unknown_server_maps_to_unknown_server(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let ghost = server("ghost");

    let err = db
        .registry
        .add_tool(&tool(&ghost, "add"))
        .await
        .expect_err("orphan tool row should be rejected");

    assert!(
        matches!(err, McpServerRegistryError::UnknownServer(id) if id == ghost.id()),
        "unexpected error: {err:?}"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remove_deletes_the_server_and_its_tools(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let calc = server("calc");
    let math = server("math");
    db.registry.register(&calc).await.expect("register calc");
    db.registry.register(&math).await.expect("register math");
    for name in ["add", "subtract"] {
        db.registry
            .add_tool(&tool(&calc, name))
            .await
            .expect("add calc row");
    }
    db.registry
        .add_tool(&tool(&math, "add"))
        .await
        .expect("add math row");

    db.registry.remove(calc.name()).await.expect("remove calc");

    assert!(
        db.registry
            .find_by_name(calc.name())
            .await
            .expect("lookup calc")
            .is_none()
    );
    assert!(
        db.registry
            .list_tools(calc.id())
            .await
            .expect("list calc rows")
            .is_empty()
    );
    let math_tools = db.registry.list_tools(math.id()).await.expect("list math rows");
    assert_eq!(math_tools.len(), 1);

    let err = db
        .registry
        .remove(calc.name())
        .await
        .expect_err("second removal should fail");
    assert!(matches!(err, McpServerRegistryError::ServerNotFound(_)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remove_tool_reports_missing_rows(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let calc = server("calc");
    db.registry.register(&calc).await.expect("register calc");
    db.registry
        .add_tool(&tool(&calc, "add"))
        .await
        .expect("add row");

    db.registry
        .remove_tool(calc.id(), "add")
        .await
        .expect("remove add row");
    let err = db
        .registry
        .remove_tool(calc.id(), "add")
        .await
        .expect_err("row is already gone");

    assert!(matches!(
        err,
        McpServerRegistryError::ToolNotFound { ref tool_name, .. } if tool_name == "add"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tools_are_listed_by_name(database: Option<TestDatabase>) {
    let Some(db) = database else { return };
    db.migrate().await;
    let calc = server("calc");
    db.registry.register(&calc).await.expect("register calc");
    for name in ["subtract", "add", "multiply"] {
        db.registry
            .add_tool(&tool(&calc, name))
            .await
            .expect("add row");
    }

    let names: Vec<String> = db
        .registry
        .list_tools(calc.id())
        .await
        .expect("list rows")
        .iter()
        .map(|row| row.name().to_owned())
        .collect();

    assert_eq!(names, ["add", "multiply", "subtract"]);
    assert!(
        db.registry
            .list_tools(McpServerId::new())
            .await
            .expect("list rows of an unknown id")
            .is_empty()
    );
}
