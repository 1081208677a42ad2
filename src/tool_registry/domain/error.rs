//! Error types for gateway domain validation.

use thiserror::Error;

/// Errors returned while constructing tool registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolRegistryDomainError {
    /// The server name is empty after trimming.
    #[error("MCP server name must not be empty")]
    EmptyServerName,

    /// The server name contains characters outside `[A-Za-z0-9_-]`.
    #[error(
        "MCP server name '{0}' contains invalid characters (only alphanumerics, hyphens and underscores allowed)"
    )]
    InvalidServerName(String),

    /// The server name exceeds the 100-character storage limit.
    #[error("MCP server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// The endpoint URL is empty.
    #[error("MCP server endpoint must not be empty")]
    EmptyEndpoint,

    /// The endpoint is not an absolute `http://` or `https://` URL with a host.
    #[error("MCP server endpoint '{0}' must be an absolute http:// or https:// URL")]
    InvalidEndpoint(String),

    /// A bearer credential was supplied but is blank.
    #[error("bearer token must not be blank when provided")]
    EmptyBearerToken,

    /// A tool definition name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// A tool input schema is not a JSON object.
    #[error("input schema for tool '{0}' must be a JSON object")]
    InvalidInputSchema(String),

    /// A public tool name does not follow the `server/tool` composition.
    #[error("public tool name '{0}' must have the form '<server>/<tool>'")]
    InvalidPublicToolName(String),
}
