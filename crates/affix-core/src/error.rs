//! Error types for affix.

use thiserror::Error;

/// Result type alias using affix's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for affix operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attachment not found
    #[error("Attachment not found: {0}")]
    AttachmentNotFound(i64),

    /// Uploaded byte stream is not a readable archive container
    #[error("Cannot open archive: {0}")]
    ArchiveOpen(String),

    /// A single archive member could not be read or extracted
    #[error("Could not extract archive member {name}: {reason}")]
    ArchiveEntry { name: String, reason: String },

    /// Attachment bytes could not be deposited at the storage location
    #[error("Attachment write failed: {0}")]
    AttachmentWrite(String),

    /// Derived artifact (thumbnail, inline rendition) could not be produced
    #[error("Derivation error: {0}")]
    Derivation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
