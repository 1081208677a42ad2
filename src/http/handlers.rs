//! Admin API handlers.

use super::{AppState, errors::AppError};
use crate::tool_registry::{
    domain::McpServer,
    ports::ToolArguments,
    services::{CatalogEntry, RegisterMcpServerRequest, ServerRegistration, ToolRefresh},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
}

/// Query string of `GET /api/v0/tools`.
#[derive(Debug, Default, Deserialize)]
pub struct ToolsQuery {
    /// Restricts the listing to one server.
    pub server: Option<String>,
}

/// Body of `POST /api/v0/tools/invoke`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeToolRequest {
    /// Public tool name.
    pub name: String,
    /// Arguments forwarded untouched.
    #[serde(default)]
    pub arguments: Option<ToolArguments>,
}

/// Published tool as listed by the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    /// Public tool name.
    pub name: String,
    /// Owning server.
    pub server: String,
    /// Tool name on the owning server.
    pub tool: String,
    /// Tool description.
    pub description: String,
    /// Input schema as reported by the backend.
    pub input_schema: Value,
}

impl From<CatalogEntry> for ToolSummary {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            name: entry.public_name().to_string(),
            server: entry.server_name().to_string(),
            tool: entry.tool_name().to_owned(),
            description: entry.description().to_owned(),
            input_schema: entry.input_schema().clone(),
        }
    }
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `POST /api/v0/servers`: admits a server and answers 201 with the
/// registration report.
///
/// # Errors
///
/// Returns the gateway failure as an [`AppError`].
pub async fn register_server(
    State(state): State<AppState>,
    Json(request): Json<RegisterMcpServerRequest>,
) -> Result<(StatusCode, Json<ServerRegistration>), AppError> {
    let registration = state.lifecycle.register(request).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// `GET /api/v0/servers`.
///
/// # Errors
///
/// Returns the gateway failure as an [`AppError`].
pub async fn list_servers(
    State(state): State<AppState>,
) -> Result<Json<Vec<McpServer>>, AppError> {
    Ok(Json(state.lifecycle.list_servers().await?))
}

/// `GET /api/v0/servers/{name}`.
///
/// # Errors
///
/// Returns the gateway failure as an [`AppError`].
pub async fn get_server(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<McpServer>, AppError> {
    Ok(Json(state.lifecycle.find_server(&name).await?))
}

/// `DELETE /api/v0/servers/{name}`: evicts the server and answers 204.
///
/// # Errors
///
/// Returns the gateway failure as an [`AppError`].
pub async fn deregister_server(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.lifecycle.deregister(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/v0/servers/{name}/refresh`: re-discovers the server's tools.
///
/// # Errors
///
/// Returns the gateway failure as an [`AppError`].
pub async fn refresh_server(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ToolRefresh>, AppError> {
    Ok(Json(state.lifecycle.refresh_tools(&name).await?))
}

/// `GET /api/v0/tools`, optionally filtered by `?server=`.
///
/// # Errors
///
/// Returns the gateway failure as an [`AppError`].
pub async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ToolsQuery>,
) -> Result<Json<Vec<ToolSummary>>, AppError> {
    let entries = state.lifecycle.list_tools(query.server.as_deref()).await?;
    Ok(Json(entries.into_iter().map(ToolSummary::from).collect()))
}

/// `POST /api/v0/tools/invoke`: routes one call and returns the backend
/// result unchanged.
///
/// # Errors
///
/// Returns the gateway failure as an [`AppError`].
pub async fn invoke_tool(
    State(state): State<AppState>,
    Json(request): Json<InvokeToolRequest>,
) -> Result<Json<Value>, AppError> {
    let InvokeToolRequest { name, arguments } = request;
    Ok(Json(state.router.invoke(&name, arguments).await?))
}
