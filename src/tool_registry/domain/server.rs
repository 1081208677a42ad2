//! Backend MCP server aggregate root.

use super::{BearerToken, McpEndpoint, McpServerId, McpServerName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A registered backend MCP server.
///
/// Servers are created once after a successful probe and never mutated
/// afterwards; the only way to change one is to deregister and register it
/// again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    id: McpServerId,
    name: McpServerName,
    endpoint: McpEndpoint,
    #[serde(skip_serializing)]
    bearer_token: Option<BearerToken>,
    description: String,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMcpServerData {
    /// Persisted server identifier.
    pub id: McpServerId,
    /// Persisted server name.
    pub name: McpServerName,
    /// Persisted endpoint.
    pub endpoint: McpEndpoint,
    /// Persisted bearer credential, when one was supplied.
    pub bearer_token: Option<BearerToken>,
    /// Persisted description.
    pub description: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl McpServer {
    /// Creates a new server with no credential and an empty description.
    #[must_use]
    pub fn new(name: McpServerName, endpoint: McpEndpoint, clock: &impl Clock) -> Self {
        Self {
            id: McpServerId::new(),
            name,
            endpoint,
            bearer_token: None,
            description: String::new(),
            created_at: clock.utc(),
        }
    }

    /// Attaches a bearer credential.
    #[must_use]
    pub fn with_bearer_token(mut self, bearer_token: BearerToken) -> Self {
        self.bearer_token = Some(bearer_token);
        self
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_owned();
        self
    }

    /// Reconstructs a server from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedMcpServerData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            endpoint: data.endpoint,
            bearer_token: data.bearer_token,
            description: data.description,
            created_at: data.created_at,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> McpServerId {
        self.id
    }

    /// Returns the validated server name.
    #[must_use]
    pub const fn name(&self) -> &McpServerName {
        &self.name
    }

    /// Returns the backend endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &McpEndpoint {
        &self.endpoint
    }

    /// Returns the bearer credential, if any.
    #[must_use]
    pub const fn bearer_token(&self) -> Option<&BearerToken> {
        self.bearer_token.as_ref()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
