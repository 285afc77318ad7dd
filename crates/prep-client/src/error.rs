//! Error types for the analysis client.

use prep_persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur while talking to the backend or local storage.
///
/// The `Display` text of transport errors is what an errored session shows
/// to the user, so those messages are written as sentences.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend answered with a non-success status.
    #[error("Server error: {status}")]
    Http { status: u16 },

    /// Request could not be sent or the connection broke mid-stream.
    #[error("Network error: {0}")]
    Network(String),

    /// Response was successful but carried no body.
    #[error("No response stream")]
    NoStream,

    /// Operation was superseded or cancelled by the caller.
    #[error("Request cancelled")]
    Cancelled,

    /// Response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local storage failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return ClientError::Decode(e.to_string());
        }
        match e.status() {
            Some(status) => ClientError::Http {
                status: status.as_u16(),
            },
            None => ClientError::Network(e.to_string()),
        }
    }
}
