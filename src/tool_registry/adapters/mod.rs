//! Adapter implementations for the gateway ports.

pub mod memory;
pub mod postgres;

mod analytics;
mod streamable_http;

pub use analytics::TracingInvocationRecorder;
pub use streamable_http::StreamableHttpConnector;
