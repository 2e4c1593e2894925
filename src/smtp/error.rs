//! Error types for the mock server

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SMTP mock server is already running")]
    AlreadyStarted,

    #[error("SMTP mock server is not running")]
    NotStarted,

    #[error("Session timed out waiting for client input")]
    Timeout,

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    #[error("Message list is stopped")]
    MessageListStopped,
}

impl SmtpError {
    /// Whether the error means the client connection can no longer be used
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            SmtpError::Io(_) | SmtpError::Timeout | SmtpError::ConnectionClosed
        )
    }
}
