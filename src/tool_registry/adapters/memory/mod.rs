//! In-memory adapters for the server registry and backend sessions.

mod backend;
mod repository;

pub use backend::{InMemoryMcpBackend, RecordedCall};
pub use repository::InMemoryMcpServerRegistry;
