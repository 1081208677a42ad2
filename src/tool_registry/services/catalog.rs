//! In-memory catalog of every callable tool across admitted servers.
//!
//! The catalog is the single source of truth for what the aggregated endpoint
//! exposes. Each operation holds the lock only for the table update; callers
//! receive clones and perform network work unlocked.

use crate::tool_registry::domain::{
    McpServerId, McpServerName, McpToolDefinition, PublicToolName,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// One published tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    public_name: PublicToolName,
    server_id: McpServerId,
    server_name: McpServerName,
    definition: McpToolDefinition,
}

impl CatalogEntry {
    /// Creates the entry for `definition` on the given server.
    #[must_use]
    pub fn new(
        server_id: McpServerId,
        server_name: McpServerName,
        definition: McpToolDefinition,
    ) -> Self {
        Self {
            public_name: PublicToolName::compose(&server_name, definition.name()),
            server_id,
            server_name,
            definition,
        }
    }

    /// Returns the public tool name.
    #[must_use]
    pub const fn public_name(&self) -> &PublicToolName {
        &self.public_name
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub const fn server_id(&self) -> McpServerId {
        self.server_id
    }

    /// Returns the owning server name.
    #[must_use]
    pub const fn server_name(&self) -> &McpServerName {
        &self.server_name
    }

    /// Returns the original tool name on the backend.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.definition.description()
    }

    /// Returns the input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        self.definition.input_schema()
    }

    /// Returns the full tool definition.
    #[must_use]
    pub const fn definition(&self) -> &McpToolDefinition {
        &self.definition
    }
}

/// Errors returned by [`ToolCatalog`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The public name is already published.
    #[error("tool '{0}' is already published")]
    Conflict(PublicToolName),
    /// No entry has the public name.
    #[error("tool '{0}' not found")]
    NotFound(String),
    /// A writer panicked while holding the lock.
    #[error("tool catalog lock poisoned")]
    LockPoisoned,
}

fn poisoned<T>(_: PoisonError<T>) -> CatalogError {
    CatalogError::LockPoisoned
}

/// Lock-guarded table of published tools keyed by public name.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    entries: RwLock<BTreeMap<PublicToolName, CatalogEntry>>,
}

impl ToolCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes an entry.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Conflict`] when the public name is taken.
    pub fn publish(&self, entry: CatalogEntry) -> Result<(), CatalogError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.contains_key(entry.public_name()) {
            return Err(CatalogError::Conflict(entry.public_name().clone()));
        }
        entries.insert(entry.public_name().clone(), entry);
        Ok(())
    }

    /// Removes an entry, returning it when it was present.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] only.
    pub fn retract(&self, public_name: &str) -> Result<Option<CatalogEntry>, CatalogError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        Ok(entries.remove(public_name))
    }

    /// Returns a copy of the entry for `public_name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when nothing is published under it.
    pub fn lookup(&self, public_name: &str) -> Result<CatalogEntry, CatalogError> {
        let entries = self.entries.read().map_err(poisoned)?;
        entries
            .get(public_name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(public_name.to_owned()))
    }

    /// Returns every entry owned by `server_name`, ordered by public name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] only.
    pub fn list_by_server(
        &self,
        server_name: &McpServerName,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .values()
            .filter(|entry| entry.server_name() == server_name)
            .cloned()
            .collect())
    }

    /// Returns every entry ordered by public name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] only.
    pub fn list_all(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.values().cloned().collect())
    }

    /// Returns the number of published entries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] only.
    pub fn len(&self) -> Result<usize, CatalogError> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    /// Returns whether nothing is published.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LockPoisoned`] only.
    pub fn is_empty(&self) -> Result<bool, CatalogError> {
        Ok(self.len()? == 0)
    }
}
