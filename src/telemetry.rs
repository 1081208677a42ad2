//! Logging setup and HTTP request logging.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` selects the filter; `info` applies when it is unset or invalid.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Logs one summary line per HTTP request.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let duration_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

    info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms,
        "request summary"
    );
    response
}
