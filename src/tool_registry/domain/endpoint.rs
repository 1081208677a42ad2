//! Network address and credential value objects for backend servers.

use super::ToolRegistryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Validated HTTP or HTTPS endpoint of a backend MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct McpEndpoint(Url);

impl McpEndpoint {
    /// Parses and validates an endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyEndpoint`] for blank input and
    /// [`ToolRegistryDomainError::InvalidEndpoint`] when the value is not an
    /// absolute `http`/`https` URL with a host.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ToolRegistryDomainError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ToolRegistryDomainError::EmptyEndpoint);
        }

        let url = Url::parse(trimmed)
            .map_err(|_| ToolRegistryDomainError::InvalidEndpoint(trimmed.to_owned()))?;
        let has_web_scheme = matches!(url.scheme(), "http" | "https");
        if !has_web_scheme || url.host_str().is_none_or(str::is_empty) {
            return Err(ToolRegistryDomainError::InvalidEndpoint(trimmed.to_owned()));
        }

        Ok(Self(url))
    }

    /// Returns the endpoint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the parsed URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for McpEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for McpEndpoint {
    type Error = ToolRegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<McpEndpoint> for String {
    fn from(value: McpEndpoint) -> Self {
        value.0.into()
    }
}

/// Bearer credential passed through to a backend server.
///
/// The token value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BearerToken(String);

impl BearerToken {
    /// Creates a bearer token from a non-blank value.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyBearerToken`] for blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ToolRegistryDomainError::EmptyBearerToken);
        }
        Ok(Self(normalized))
    }

    /// Exposes the raw credential for use in an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("BearerToken(<redacted>)")
    }
}

impl TryFrom<String> for BearerToken {
    type Error = ToolRegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BearerToken> for String {
    fn from(value: BearerToken) -> Self {
        value.0
    }
}
