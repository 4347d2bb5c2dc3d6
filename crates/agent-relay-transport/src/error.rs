//! HTTP error responses.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to read UI document {}: {source}", .path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        tracing::error!("{self}");
        let body = ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: "internal_error".to_string(),
            },
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
