//! Junction: a registry-and-proxy gateway for MCP tool servers.
//!
//! Backend MCP servers are registered once and their combined tool surface
//! is exposed through a single aggregated endpoint.
//!
//! # Architecture
//!
//! Junction follows hexagonal architecture principles:
//!
//! - **Domain**: Validated value types with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence, backends, and analytics
//! - **Adapters**: Concrete implementations of ports (`PostgreSQL`, rmcp, memory)
//!
//! # Modules
//!
//! - [`tool_registry`]: Server registry, tool catalog, and invocation routing
//! - [`http`]: Admin API and aggregated MCP endpoint
//! - [`config`]: Environment-driven configuration
//! - [`telemetry`]: Logging setup

pub mod config;
pub mod http;
pub mod telemetry;
pub mod tool_registry;
