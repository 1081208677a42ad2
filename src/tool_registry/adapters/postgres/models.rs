//! Diesel row models for registry persistence.

use super::schema::{mcp_servers, mcp_tools};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for server records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mcp_servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct McpServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Unique server name.
    pub name: String,
    /// Endpoint URL.
    pub endpoint: String,
    /// Optional bearer credential.
    pub bearer_token: Option<String>,
    /// Description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for server records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mcp_servers)]
pub struct NewMcpServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Unique server name.
    pub name: String,
    /// Endpoint URL.
    pub endpoint: String,
    /// Optional bearer credential.
    pub bearer_token: Option<String>,
    /// Description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result and insert row for tool records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = mcp_tools)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct McpToolRow {
    /// Internal tool identifier.
    pub id: uuid::Uuid,
    /// Owning server identifier.
    pub server_id: uuid::Uuid,
    /// Original tool name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Input schema.
    pub input_schema: Value,
    /// Optional output schema.
    pub output_schema: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
