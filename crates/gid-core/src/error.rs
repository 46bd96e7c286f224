//! Error types for gid-core

use thiserror::Error;

/// The main error type for gid-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors from file-backed storage
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Transport errors talking to the answering service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The answering service replied with a non-success status
    #[error("Remote call failed with status {status}")]
    Remote { status: u16 },

    /// Storage errors that are not plain I/O
    #[error("Storage error: {0}")]
    Storage(String),
}

/// A specialized Result type for gid-core operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
