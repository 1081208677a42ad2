//! Shared fixtures for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use junction::tool_registry::{
    adapters::postgres::{McpServerPgPool, PostgresMcpServerRegistry},
    domain::{McpEndpoint, McpServer, McpServerName, McpToolDefinition, McpToolRecord},
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::json;
use uuid::Uuid;

/// Points every pooled connection at one schema.
#[derive(Debug)]
struct SearchPath(String);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for SearchPath {
    fn on_acquire(&self, connection: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(&format!("SET search_path TO {}", self.0))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A registry living in its own schema, dropped with the value.
pub struct TestDatabase {
    /// Registry under test; call [`Self::migrate`] before use.
    pub registry: PostgresMcpServerRegistry,
    database_url: String,
    schema: String,
}

impl TestDatabase {
    fn create(database_url: String) -> Self {
        let schema = format!("junction_test_{}", Uuid::new_v4().simple());
        let mut admin = PgConnection::establish(&database_url).expect("connect to DATABASE_URL");
        admin
            .batch_execute(&format!("CREATE SCHEMA {schema}"))
            .expect("create test schema");

        let pool: McpServerPgPool = Pool::builder()
            .max_size(2)
            .connection_customizer(Box::new(SearchPath(schema.clone())))
            .build(ConnectionManager::<PgConnection>::new(database_url.as_str()))
            .expect("build test pool");

        Self {
            registry: PostgresMcpServerRegistry::new(pool),
            database_url,
            schema,
        }
    }

    /// Applies the registry tables to this schema.
    pub async fn migrate(&self) {
        self.registry
            .ensure_schema()
            .await
            .expect("apply registry schema");
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let dropped = PgConnection::establish(&self.database_url)
            .map_err(|err| err.to_string())
            .and_then(|mut admin| {
                admin
                    .batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
                    .map_err(|err| err.to_string())
            });
        if let Err(err) = dropped {
            tracing::warn!(schema = %self.schema, error = %err, "failed to drop test schema");
        }
    }
}

/// A fresh schema on `DATABASE_URL`, or `None` when it is unset.
#[fixture]
pub fn database() -> Option<TestDatabase> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(TestDatabase::create)
}

/// Builds an unpersisted server named `name`.
pub fn server(name: &str) -> McpServer {
    McpServer::new(
        McpServerName::new(name).expect("valid server name"),
        McpEndpoint::parse(format!("http://{name}.test/mcp")).expect("valid endpoint"),
        &DefaultClock,
    )
}

/// Builds a tool row named `tool` owned by `owner`.
pub fn tool(owner: &McpServer, tool: &str) -> McpToolRecord {
    McpToolRecord::new(
        owner.id(),
        McpToolDefinition::new(tool, "", json!({"type": "object"})).expect("valid tool"),
        &DefaultClock,
    )
}
