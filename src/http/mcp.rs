//! Aggregated MCP endpoint speaking JSON-RPC 2.0 over plain HTTP POST.
//!
//! `tools/list` answers from the catalog and `tools/call` goes through the
//! invocation router; backend results are returned unchanged.

use super::AppState;
use crate::tool_registry::{
    ports::ToolArguments,
    services::{CatalogEntry, GatewayErrorKind, McpGatewayError},
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, error};

/// MCP protocol revision advertised by `initialize`.
pub const SUPPORTED_PROTOCOL_VERSION: &str = "2025-03-26";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;
const BACKEND_ERROR: i32 = -32000;

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<ToolArguments>,
}

/// `POST /mcp`: handles single and batched JSON-RPC messages; a payload of
/// only notifications is answered with 204.
pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        return Json(json_rpc_error(None, PARSE_ERROR, "Parse error", None)).into_response();
    };

    if let Value::Array(batch) = payload {
        if batch.is_empty() {
            return Json(json_rpc_error(None, INVALID_REQUEST, "Invalid Request", None))
                .into_response();
        }
        let mut responses = Vec::with_capacity(batch.len());
        for item in batch {
            if let Some(response) = handle_message(&state, item).await {
                responses.push(response);
            }
        }
        if responses.is_empty() {
            return StatusCode::NO_CONTENT.into_response();
        }
        return Json(Value::Array(responses)).into_response();
    }

    match handle_message(&state, payload).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Handles one JSON-RPC message. Notifications produce no response.
async fn handle_message(state: &AppState, payload: Value) -> Option<Value> {
    let raw_id = payload.get("id").cloned();
    let Ok(request) = serde_json::from_value::<JsonRpcRequest>(payload) else {
        return Some(json_rpc_error(raw_id, INVALID_REQUEST, "Invalid Request", None));
    };
    if request.jsonrpc != "2.0" || request.method.trim().is_empty() {
        return Some(json_rpc_error(
            request.id,
            INVALID_REQUEST,
            "Invalid Request",
            None,
        ));
    }

    let Some(id) = request.id else {
        debug!(method = %request.method, "ignoring MCP notification");
        return None;
    };

    let outcome = match request.method.as_str() {
        "initialize" => Ok(initialize_result()),
        "ping" => Ok(json!({})),
        "tools/list" => list_tools(state),
        "tools/call" => call_tool(state, request.params).await,
        _ => Err(json_rpc_error(None, METHOD_NOT_FOUND, "Method not found", None)),
    };

    Some(match outcome {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(mut response) => {
            if let Some(object) = response.as_object_mut() {
                object.insert("id".to_owned(), id);
            }
            response
        }
    })
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": SUPPORTED_PROTOCOL_VERSION,
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        }
    })
}

fn list_tools(state: &AppState) -> Result<Value, Value> {
    let entries = state
        .catalog
        .list_all()
        .map_err(|err| gateway_error(&McpGatewayError::from(err)))?;
    let tools: Vec<Value> = entries.iter().map(tool_descriptor).collect();
    Ok(json!({ "tools": tools }))
}

fn tool_descriptor(entry: &CatalogEntry) -> Value {
    let mut descriptor = Map::new();
    descriptor.insert("name".to_owned(), json!(entry.public_name()));
    if !entry.description().is_empty() {
        descriptor.insert("description".to_owned(), json!(entry.description()));
    }
    descriptor.insert("inputSchema".to_owned(), entry.input_schema().clone());
    if let Some(schema) = entry.definition().output_schema() {
        descriptor.insert("outputSchema".to_owned(), schema.clone());
    }
    Value::Object(descriptor)
}

async fn call_tool(state: &AppState, params: Option<Value>) -> Result<Value, Value> {
    let Some(CallToolParams { name, arguments }) =
        params.and_then(|raw| serde_json::from_value(raw).ok())
    else {
        return Err(json_rpc_error(None, INVALID_PARAMS, "Invalid params", None));
    };

    state
        .router
        .invoke(&name, arguments)
        .await
        .map_err(|err| gateway_error(&err))
}

fn gateway_error(err: &McpGatewayError) -> Value {
    let kind = err.kind();
    let (code, message) = match kind {
        GatewayErrorKind::Validation | GatewayErrorKind::NotFound => {
            (INVALID_PARAMS, "Invalid params")
        }
        GatewayErrorKind::Internal => {
            error!(error = %err, "MCP request failed with internal error");
            return json_rpc_error(None, INTERNAL_ERROR, "Internal error", None);
        }
        GatewayErrorKind::Conflict
        | GatewayErrorKind::Transport
        | GatewayErrorKind::Protocol
        | GatewayErrorKind::Invocation => (BACKEND_ERROR, "Backend error"),
    };
    let mut data = json!({
        "code": kind.as_str(),
        "message": err.to_string(),
    });
    if let (Some(server), Some(object)) = (err.server(), data.as_object_mut()) {
        object.insert("server".to_owned(), json!(server));
    }
    json_rpc_error(None, code, message, Some(data))
}

fn json_rpc_error(id: Option<Value>, code: i32, message: &str, data: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message,
    });
    if let (Some(details), Some(object)) = (data, error.as_object_mut()) {
        object.insert("data".to_owned(), details);
    }
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error,
    })
}
