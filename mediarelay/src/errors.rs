use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Shared secret missing from the request or not matching
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed request: body, guild ID or content URL
    #[error("{message}")]
    BadRequest { message: String },

    /// The remote origin could not be reached or rejected the request
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The remote origin served a content type outside the mime table
    #[error("Unsupported content type {content_type:?}")]
    UnsupportedContentType { content_type: Option<String> },

    /// The fetched body exceeds the configured maximum
    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// An outbound call ran past its deadline
    #[error("Timed out while {operation}")]
    Timeout { operation: String },

    /// Configuration is missing or inconsistent
    #[error("Backend misconfigured: {what}")]
    Misconfigured { what: String },

    /// The storage backend could not be reached or rejected the upload
    #[error("Failed to upload {path}: {reason}")]
    UploadFailed { path: String, reason: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::FetchFailed { .. } => StatusCode::BAD_REQUEST,
            Error::UnsupportedContentType { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::Misconfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::UploadFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthorized => "unauthorized".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::FetchFailed { .. } => "unable to fetch content".to_string(),
            Error::UnsupportedContentType { .. } => "invalid content type".to_string(),
            Error::PayloadTooLarge { .. } => "payload too large".to_string(),
            Error::Timeout { operation } => format!("timed out while {operation}"),
            Error::Misconfigured { .. } => "backend misconfigured".to_string(),
            Error::UploadFailed { .. } => "unable to upload".to_string(),
            Error::Other(_) => "unexpected server error".to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Misconfigured { .. } | Error::UploadFailed { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::FetchFailed { .. } | Error::Timeout { .. } => {
                tracing::warn!("Upstream error: {}", self);
            }
            Error::Unauthorized => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::UnsupportedContentType { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for relay operation results
pub type Result<T> = std::result::Result<T, Error>;
