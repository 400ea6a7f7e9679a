//! Error types for diary-core

use thiserror::Error;

use crate::models::EntryId;

/// Result type alias using diary-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure classes used by callers to pick a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field was empty or referenced something that does not exist.
    InvalidInput,
    /// No session token is present.
    NotAuthenticated,
    /// Network failure or a non-success response from the backend.
    Transport,
    /// An asset upload failed and aborted its batch.
    Upload,
    /// The server answered with a payload that does not match the schema.
    MalformedResponse,
    /// The initiating view went away before the action finished.
    Cancelled,
}

/// Errors that can occur in diary-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Entry not present in the local store
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Authenticated call attempted without a session token
    #[error("Not signed in")]
    NotAuthenticated,

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the backend or asset host
    #[error("Request failed with HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// Asset upload failure that aborted a batch
    #[error("Upload of image {} failed: {message}", .index + 1)]
    Upload {
        index: usize,
        message: String,
        /// Message the asset host itself reported, if any
        server_message: Option<String>,
    },

    /// Server payload did not match the expected schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Action discarded because its view was torn down
    #[error("Action cancelled")]
    Cancelled,

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::EntryNotFound(_) | Self::Config(_) | Self::Io(_) => {
                ErrorKind::InvalidInput
            }
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::Http(_) | Self::Api { .. } => ErrorKind::Transport,
            Self::Upload { .. } => ErrorKind::Upload,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Message reported by the server, when the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            }
            | Self::Upload {
                server_message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }
}
