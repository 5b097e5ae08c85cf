use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

pub const TOKEN_REQUIRED: &str = "Token is required";
pub const TOKEN_INVALID: &str = "Invalid token";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    #[error("token {0} not found")]
    NotFound(String),

    #[error("token {0} already used")]
    AlreadyUsed(String),

    // Storage failures never reach the caller beyond a generic message.
    #[error("storage read error: {0}")]
    StorageRead(#[source] StorageError),

    #[error("storage write error: {0}")]
    StorageWrite(#[source] StorageError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyUsed(_) => StatusCode::FORBIDDEN,
            Self::StorageRead(_) | Self::StorageWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest(msg) => *msg,
            Self::NotFound(_) => "Token not found",
            Self::AlreadyUsed(_) => "Token already used",
            Self::StorageRead(_) => "Internal server error",
            Self::StorageWrite(_) => "Failed to update token status",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::StorageRead(_) | Self::StorageWrite(_) => {
                tracing::error!("Generating response for AppError: {}", self)
            }
            _ => tracing::debug!("Generating response for AppError: {}", self),
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
