//! Registry of backend MCP servers and the aggregated tool catalog.
//!
//! Backend servers are admitted after a reachability probe, their tools are
//! published under `server/tool` public names, and calls on those names are
//! routed to the owning backend. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
