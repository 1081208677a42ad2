//! Step definitions for MCP gateway behaviour scenarios.

pub mod given;
pub mod when;
pub mod world;
