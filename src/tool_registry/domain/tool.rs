//! MCP tool definition value object and its persisted record.

use super::{McpServerId, McpToolId, ToolRegistryDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical metadata for a tool exposed by a backend MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_schema: Option<Value>,
}

impl McpToolDefinition {
    /// Creates a tool definition.
    ///
    /// The description may be empty; backends are not required to document
    /// their tools.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyToolName`] when the name is
    /// blank and [`ToolRegistryDomainError::InvalidInputSchema`] when the
    /// input schema is not a JSON object.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Result<Self, ToolRegistryDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(ToolRegistryDomainError::EmptyToolName);
        }

        if !input_schema.is_object() {
            return Err(ToolRegistryDomainError::InvalidInputSchema(normalized_name));
        }

        Ok(Self {
            name: normalized_name,
            description: description.into().trim().to_owned(),
            input_schema,
            output_schema: None,
        })
    }

    /// Sets an optional output schema.
    #[must_use]
    pub fn with_output_schema(mut self, output_schema: Value) -> Self {
        self.output_schema = Some(output_schema);
        self
    }

    /// Returns the original tool name as reported by the backend.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the optional output schema.
    #[must_use]
    pub const fn output_schema(&self) -> Option<&Value> {
        self.output_schema.as_ref()
    }
}

/// A tool row owned by exactly one registered server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolRecord {
    id: McpToolId,
    server_id: McpServerId,
    definition: McpToolDefinition,
    created_at: DateTime<Utc>,
}

impl McpToolRecord {
    /// Creates a new record for a tool discovered on `server_id`.
    #[must_use]
    pub fn new(server_id: McpServerId, definition: McpToolDefinition, clock: &impl Clock) -> Self {
        Self {
            id: McpToolId::new(),
            server_id,
            definition,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a record from persistence.
    #[must_use]
    pub const fn from_persisted(
        id: McpToolId,
        server_id: McpServerId,
        definition: McpToolDefinition,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            server_id,
            definition,
            created_at,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> McpToolId {
        self.id
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub const fn server_id(&self) -> McpServerId {
        self.server_id
    }

    /// Returns the tool definition.
    #[must_use]
    pub const fn definition(&self) -> &McpToolDefinition {
        &self.definition
    }

    /// Returns the original tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
