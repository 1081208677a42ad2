//! Globally unique public tool names.
//!
//! A public name is `"{server}/{tool}"`. Server names cannot contain `/`, so
//! splitting on the first separator always recovers the original pair and two
//! distinct pairs never compose to the same public name.

use super::{McpServerName, ToolRegistryDomainError};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

const SEPARATOR: char = '/';

/// Public tool name under which a backend tool is exposed by the gateway.
///
/// Equality, ordering and hashing follow the full string so that maps keyed
/// by this type can be queried with a plain `&str`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicToolName {
    full: String,
    server_len: usize,
}

impl PublicToolName {
    /// Composes the public name for `tool_name` on `server`.
    #[must_use]
    pub fn compose(server: &McpServerName, tool_name: &str) -> Self {
        let server_len = server.as_str().len();
        Self {
            full: format!("{server}{SEPARATOR}{tool_name}"),
            server_len,
        }
    }

    /// Parses a public name received from a client.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::InvalidPublicToolName`] when the
    /// value has no separator, an invalid server part, or an empty tool part.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ToolRegistryDomainError> {
        let raw = value.as_ref();
        let invalid = || ToolRegistryDomainError::InvalidPublicToolName(raw.to_owned());

        let (server_part, tool_part) = raw.split_once(SEPARATOR).ok_or_else(invalid)?;
        if tool_part.is_empty() || server_part.trim() != server_part {
            return Err(invalid());
        }
        let server = McpServerName::new(server_part).map_err(|_| invalid())?;
        Ok(Self::compose(&server, tool_part))
    }

    /// Returns the full public name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Returns the owning server's name portion.
    #[must_use]
    pub fn server_name(&self) -> &str {
        self.full.get(..self.server_len).unwrap_or_default()
    }

    /// Returns the original tool name portion.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        self.full
            .get(self.server_len + SEPARATOR.len_utf8()..)
            .unwrap_or_default()
    }
}

impl fmt::Display for PublicToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.full)
    }
}

impl PartialEq for PublicToolName {
    fn eq(&self, other: &Self) -> bool {
        self.full == other.full
    }
}

impl Eq for PublicToolName {}

impl Hash for PublicToolName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full.hash(state);
    }
}

impl PartialOrd for PublicToolName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicToolName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.full.cmp(&other.full)
    }
}

impl Borrow<str> for PublicToolName {
    fn borrow(&self) -> &str {
        &self.full
    }
}

impl TryFrom<String> for PublicToolName {
    type Error = ToolRegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PublicToolName> for String {
    fn from(value: PublicToolName) -> Self {
        value.full
    }
}
