//! Domain model for backend MCP servers and their tools.
//!
//! The domain models server identity, endpoint and credential values,
//! discovered tool metadata, and the public naming rule for aggregated tools.
//! Infrastructure concerns remain outside this boundary.

mod endpoint;
mod error;
mod ids;
mod public_name;
mod server;
mod tool;

pub use endpoint::{BearerToken, McpEndpoint};
pub use error::ToolRegistryDomainError;
pub use ids::{McpServerId, McpServerName, McpToolId};
pub use public_name::PublicToolName;
pub use server::{McpServer, PersistedMcpServerData};
pub use tool::{McpToolDefinition, McpToolRecord};
