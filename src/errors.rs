use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{fmt, io};
use thiserror::Error;

/// Why an upload request could not be fully ingested.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The body could not be split into parts: bad boundary, truncated
    /// stream, undecodable field text, or the body limit was hit.
    #[error("malformed multipart body: {0}")]
    Malformed(#[from] MultipartError),
    /// The upload store failed to spool or move a file.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Malformed(err) => {
                tracing::warn!("rejecting upload: {}", err);
                AppError::new(err.status(), err.body_text())
            }
            IngestError::Io(err) => {
                tracing::error!("upload store failure: {}", err);
                AppError::internal("failed to store upload")
            }
        }
    }
}
