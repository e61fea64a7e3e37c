//! Response shapes and error mapping.
//!
//! # Design Decisions
//! - Every body carries `success`
//! - Failures always carry the most specific message available: the node's
//!   raw log for rejections, the raw error text otherwise
//! - 400 for anything the caller can fix or the chain refused, 500 otherwise

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::service::is_client_error;
use crate::blockchain::BlockchainError;
use crate::resilience::{classify, ErrorClass};

/// Successful body: `{"success": true, ...data}`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

/// Wrap `data` in a success body.
pub fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success { success: true, data })
}

#[derive(Debug, Serialize)]
struct Failure {
    success: bool,
    error: String,
}

/// Errors surfaced by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    /// A read-only request ran past the configured deadline.
    #[error("Request timed out after {0}s")]
    DeadlineExceeded(u64),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DeadlineExceeded(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Blockchain(err) => {
                if is_client_error(err) || classify(err) == ErrorClass::NonRetryableTransaction {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        (
            status,
            Json(Failure {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}
