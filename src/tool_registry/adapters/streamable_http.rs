//! Backend connector speaking MCP over streamable HTTP.

use crate::tool_registry::{
    domain::McpServer,
    ports::{
        BackendTool, McpBackendConnector, McpBackendError, McpBackendResult, McpBackendSession,
        ToolArguments,
    },
};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rmcp::{
    RoleClient, ServiceExt,
    model::{CallToolRequestParam, Tool},
    service::{RunningService, ServiceError},
    transport::{
        StreamableHttpClientTransport, streamable_http_client::StreamableHttpClientTransportConfig,
    },
};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

type McpClient = RunningService<RoleClient, ()>;

/// Opens rmcp client sessions to backends over streamable HTTP.
#[derive(Debug, Clone)]
pub struct StreamableHttpConnector {
    connect_timeout: Duration,
}

impl StreamableHttpConnector {
    /// Creates a connector whose TCP connects give up after `connect_timeout`.
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    fn build_http_client(&self, server: &McpServer) -> McpBackendResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder().connect_timeout(self.connect_timeout);

        if let Some(token) = server.bearer_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .map_err(McpBackendError::transport)?;
            value.set_sensitive(true);
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        builder.build().map_err(McpBackendError::transport)
    }
}

#[async_trait]
impl McpBackendConnector for StreamableHttpConnector {
    async fn open(&self, server: &McpServer) -> McpBackendResult<Arc<dyn McpBackendSession>> {
        let http_client = self.build_http_client(server)?;
        let config = StreamableHttpClientTransportConfig::with_uri(server.endpoint().as_str());
        let transport = StreamableHttpClientTransport::with_client(http_client, config);

        let client = ().serve(transport).await.map_err(McpBackendError::transport)?;
        debug!(server = %server.name(), endpoint = %server.endpoint(), "opened MCP session");

        Ok(Arc::new(StreamableHttpSession {
            client: Mutex::new(Some(Arc::new(client))),
        }))
    }
}

struct StreamableHttpSession {
    client: Mutex<Option<Arc<McpClient>>>,
}

impl StreamableHttpSession {
    fn client(&self) -> McpBackendResult<Arc<McpClient>> {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(McpBackendError::SessionClosed)
    }
}

fn map_service_error(err: ServiceError) -> McpBackendError {
    match err {
        ServiceError::McpError(_) | ServiceError::UnexpectedResponse => {
            McpBackendError::protocol(err)
        }
        _ => McpBackendError::transport(err),
    }
}

fn to_backend_tool(tool: Tool) -> BackendTool {
    BackendTool {
        name: tool.name.into_owned(),
        description: tool.description.map(Cow::into_owned),
        input_schema: Value::Object((*tool.input_schema).clone()),
        output_schema: tool
            .output_schema
            .map(|schema| Value::Object((*schema).clone())),
    }
}

#[async_trait]
impl McpBackendSession for StreamableHttpSession {
    async fn list_tools(&self) -> McpBackendResult<Vec<BackendTool>> {
        let client = self.client()?;
        let tools = client
            .peer()
            .list_all_tools()
            .await
            .map_err(map_service_error)?;
        Ok(tools.into_iter().map(to_backend_tool).collect())
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Option<ToolArguments>,
    ) -> McpBackendResult<Value> {
        let client = self.client()?;
        let request = CallToolRequestParam {
            name: Cow::Owned(tool_name.to_owned()),
            arguments,
        };
        let result = client
            .peer()
            .call_tool(request)
            .await
            .map_err(map_service_error)?;
        serde_json::to_value(result).map_err(McpBackendError::protocol)
    }

    async fn close(&self) {
        let taken = self
            .client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        // In-flight calls keep their clone; the last one to finish drops the
        // client, which cancels it.
        if let Some(client) = taken.and_then(Arc::into_inner)
            && let Err(err) = client.cancel().await
        {
            warn!(error = %err, "error closing MCP session");
        }
    }
}
