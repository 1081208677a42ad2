//! HTTP error responses for the admin API.

use crate::tool_registry::services::{GatewayErrorKind, McpGatewayError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error returned by admin handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// A gateway service failed.
    #[error(transparent)]
    Gateway(#[from] McpGatewayError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable error kind code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Backend server the failure is attributed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

/// Returns the HTTP status for a gateway error kind.
#[must_use]
pub const fn status_for(kind: GatewayErrorKind) -> StatusCode {
    match kind {
        GatewayErrorKind::Validation => StatusCode::BAD_REQUEST,
        GatewayErrorKind::Conflict => StatusCode::CONFLICT,
        GatewayErrorKind::NotFound => StatusCode::NOT_FOUND,
        GatewayErrorKind::Transport | GatewayErrorKind::Protocol | GatewayErrorKind::Invocation => {
            StatusCode::BAD_GATEWAY
        }
        GatewayErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let Self::Gateway(err) = self;
        let kind = err.kind();
        let server = err.server().map(ToString::to_string);
        let message = if kind == GatewayErrorKind::Internal {
            error!(error = %err, "request failed with internal error");
            "internal server error".to_owned()
        } else {
            err.to_string()
        };

        (
            status_for(kind),
            Json(ErrorResponse {
                code: kind.as_str(),
                message,
                server,
            }),
        )
            .into_response()
    }
}
