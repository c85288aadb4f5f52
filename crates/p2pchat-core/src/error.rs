//! Error types for p2pchat

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for directory and node operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// A required field was missing or empty
    #[error("Validation error: {0}")]
    Validation(String),

    /// The directory has no record for this username
    #[error("Not found: {0}")]
    NotFound(String),

    /// The recipient of a send is not registered in the directory
    #[error("Recipient unknown: {0}")]
    RecipientUnknown(String),

    /// A peer identity string could not be decoded
    #[error("Invalid peer id: {0}")]
    InvalidPeerId(String),

    /// A peer address string could not be parsed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Dialing a peer failed
    #[error("Connect error: {0}")]
    Connect(String),

    /// A chat stream could not be opened
    #[error("Open stream failed: {0}")]
    StreamOpen(String),

    /// Writing the payload to a chat stream failed
    #[error("Write failed: {0}")]
    StreamWrite(String),

    /// A bounded operation ran out of time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// An inbound payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The directory could not be reached or replied unexpectedly
    #[error("Directory error: {0}")]
    Directory(String),

    /// Registering this node with the directory failed
    #[error("Registration failed: {0}")]
    Registration(String),

    /// Endpoint or transport setup error
    #[error("Network error: {0}")]
    Network(String),

    /// Error while encoding a value
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// HTTP status this error is reported with on the HTTP surfaces.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::Validation(_) | ChatError::InvalidPeerId(_) | ChatError::InvalidAddress(_) => {
                StatusCode::BAD_REQUEST
            }
            ChatError::NotFound(_) | ChatError::RecipientUnknown(_) => StatusCode::NOT_FOUND,
            ChatError::Directory(_) => StatusCode::BAD_GATEWAY,
            ChatError::Connect(_)
            | ChatError::StreamOpen(_)
            | ChatError::StreamWrite(_)
            | ChatError::Timeout(_)
            | ChatError::Decode(_)
            | ChatError::Registration(_)
            | ChatError::Network(_)
            | ChatError::Serialization(_)
            | ChatError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body shared by the directory and the control plane
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias using ChatError
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChatError::RecipientUnknown("carol".to_string());
        assert_eq!(format!("{}", err), "Recipient unknown: carol");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let chat_err: ChatError = io_err.into();
        assert!(matches!(chat_err, ChatError::Io(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ChatError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ChatError::InvalidPeerId("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ChatError::RecipientUnknown("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ChatError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ChatError::StreamOpen("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ChatError::StreamWrite("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ChatError::Timeout("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ChatError::Directory("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
