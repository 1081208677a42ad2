//! Gateway services: the tool catalog, connection manager, lifecycle
//! orchestrator, and invocation router.

mod catalog;
mod connections;
mod error;
mod lifecycle;
mod router;

pub use catalog::{CatalogEntry, CatalogError, ToolCatalog};
pub use connections::McpConnectionManager;
pub use error::{GatewayErrorKind, McpGatewayError, McpGatewayResult};
pub use lifecycle::{
    CatalogRestore, McpServerLifecycleService, RegisterMcpServerRequest, ServerRegistration,
    SkippedTool, ToolRefresh,
};
pub use router::McpInvocationRouter;
