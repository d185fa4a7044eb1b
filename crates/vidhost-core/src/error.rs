//! Error types module
//!
//! All failures of the client orchestration layer are unified under
//! [`ClientError`]. Network failures are split into transport errors (the request
//! never produced a response) and server rejections (a non-2xx response); the
//! remaining variants are raised locally before any request is sent.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a rejected request
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the user can retry the same gesture and expect a different result
    fn is_recoverable(&self) -> bool;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server rejected request with status {status}: {message}")]
    ServerRejection { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Action already in flight: {0}")]
    InFlight(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(err.to_string())
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn client_error_static_metadata(err: &ClientError) -> (&'static str, bool, LogLevel) {
    match err {
        ClientError::Transport(_) => ("TRANSPORT_ERROR", true, LogLevel::Warn),
        ClientError::ServerRejection { status, .. } if *status >= 500 => {
            ("SERVER_ERROR", true, LogLevel::Error)
        }
        ClientError::ServerRejection { .. } => ("SERVER_REJECTION", true, LogLevel::Warn),
        ClientError::InvalidResponse(_) => ("INVALID_RESPONSE", true, LogLevel::Error),
        ClientError::Precondition(_) => ("PRECONDITION_VIOLATION", false, LogLevel::Error),
        ClientError::Validation(_) => ("VALIDATION_ERROR", false, LogLevel::Debug),
        ClientError::InFlight(_) => ("ACTION_IN_FLIGHT", false, LogLevel::Debug),
        ClientError::Io(_) => ("IO_ERROR", false, LogLevel::Warn),
        ClientError::Config(_) => ("CONFIG_ERROR", false, LogLevel::Error),
    }
}

impl ClientError {
    pub fn server_rejection(status: u16, message: impl Into<String>) -> Self {
        ClientError::ServerRejection {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of a server rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ServerRejection { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Emit this error through `tracing` at the level its metadata assigns.
    pub fn log(&self, action: &str) {
        match self.log_level() {
            LogLevel::Debug => tracing::debug!(action, error = %self, "Client action failed"),
            LogLevel::Warn => tracing::warn!(action, error = %self, "Client action failed"),
            LogLevel::Error => tracing::error!(action, error = %self, "Client action failed"),
        }
    }
}

impl ErrorMetadata for ClientError {
    fn error_code(&self) -> &'static str {
        client_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        client_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        client_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            ClientError::Transport(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            // The server's own message wins; status texts only fill in for empty bodies.
            ClientError::ServerRejection { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            ClientError::ServerRejection { status, .. } => match status {
                401 => "You must be logged in to do that.".to_string(),
                403 => "You do not have permission to do that.".to_string(),
                404 => "Video not found.".to_string(),
                _ => format!("The server refused the request ({}).", status),
            },
            ClientError::InvalidResponse(_) => {
                "The server sent an unexpected response.".to_string()
            }
            ClientError::Precondition(ref msg) => msg.clone(),
            ClientError::Validation(ref msg) => msg.clone(),
            ClientError::InFlight(_) => {
                "Please wait for the previous action to finish.".to_string()
            }
            ClientError::Io(_) => "The selected file could not be read.".to_string(),
            ClientError::Config(_) => "The client is misconfigured.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_transport() {
        let err = ClientError::Transport("connection refused".to_string());
        assert_eq!(err.error_code(), "TRANSPORT_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.client_message().contains("Could not reach the server"));
    }

    #[test]
    fn test_error_metadata_server_rejection_uses_status() {
        let err = ClientError::server_rejection(
            403,
            "You do not have permission to delete this video",
        );
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.error_code(), "SERVER_REJECTION");
        assert_eq!(
            err.client_message(),
            "You do not have permission to delete this video"
        );

        let err = ClientError::server_rejection(404, "Like not found");
        assert_eq!(err.client_message(), "Like not found");

        let err = ClientError::server_rejection(404, "  ");
        assert_eq!(err.client_message(), "Video not found.");
        let err = ClientError::server_rejection(401, "");
        assert_eq!(err.client_message(), "You must be logged in to do that.");

        let err = ClientError::server_rejection(400, "Video already liked");
        assert_eq!(err.client_message(), "Video already liked");

        let err = ClientError::server_rejection(503, "");
        assert_eq!(err.error_code(), "SERVER_ERROR");
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(err.client_message().contains("503"));
    }

    #[test]
    fn test_error_metadata_local_errors() {
        let err = ClientError::Validation("Comment cannot be empty".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(err.status(), None);
        assert_eq!(err.client_message(), "Comment cannot be empty");
        assert_eq!(err.log_level(), LogLevel::Debug);

        let err = ClientError::Precondition("no upload session".to_string());
        assert_eq!(err.error_code(), "PRECONDITION_VIOLATION");
        assert_eq!(err.log_level(), LogLevel::Error);

        let err = ClientError::InFlight("like");
        assert_eq!(err.error_code(), "ACTION_IN_FLIGHT");
    }

    #[test]
    fn test_from_io_and_json() {
        let err = ClientError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.error_code(), "IO_ERROR");

        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ClientError::from(json_err);
        assert_eq!(err.error_code(), "INVALID_RESPONSE");
    }
}
