//! Identifier and validated-name types for MCP servers and tools.

use super::ToolRegistryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for an MCP server name, matching `VARCHAR(100)`.
const MAX_SERVER_NAME_LENGTH: usize = 100;

/// Unique identifier for an MCP server registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct McpServerId(Uuid);

impl McpServerId {
    /// Creates a new random MCP server identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an MCP server identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for McpServerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for McpServerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a persisted tool record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct McpToolId(Uuid);

impl McpToolId {
    /// Creates a new random tool identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tool identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for McpToolId {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated MCP server name.
///
/// Names are the human-chosen identity of a backend and the prefix of every
/// public tool name it contributes, so they may not contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct McpServerName(String);

impl McpServerName {
    /// Creates a validated MCP server name.
    ///
    /// Surrounding whitespace is trimmed and case is preserved. Only
    /// characters in `[A-Za-z0-9_-]` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let normalized = value.into().trim().to_owned();

        if normalized.is_empty() {
            return Err(ToolRegistryDomainError::EmptyServerName);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_alphanumeric() || character == '_' || character == '-'
        });
        if !is_valid {
            return Err(ToolRegistryDomainError::InvalidServerName(normalized));
        }

        if normalized.len() > MAX_SERVER_NAME_LENGTH {
            return Err(ToolRegistryDomainError::ServerNameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the MCP server name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for McpServerName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for McpServerName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for McpServerName {
    type Error = ToolRegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<McpServerName> for String {
    fn from(value: McpServerName) -> Self {
        value.0
    }
}
