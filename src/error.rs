//! MikroDB - Custom Error Types
//! Defines the error hierarchy for the storage engine.
//!
//! Note `VersionMismatch` is deliberately absent here: optimistic-concurrency
//! rejection is a normal `false` return from `write`/`delete`, never a raised
//! error.

use thiserror::Error;

/// Custom Result type for the MikroDB engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the MikroDB storage engine.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors from file operations (WAL, table files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing file or missing key; expected and recoverable.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed arguments: missing table, oversized key, key with
    /// whitespace/newlines, missing value, and similar caller errors.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid magic bytes or an unreadable header when loading a table
    /// file. The table is reinitialized empty; WAL replay may re-materialize
    /// records.
    #[error("table file corrupted: {0}")]
    Corruption(String),

    /// A checkpoint could not complete. The marker file is retained so the
    /// next engine start retries it.
    #[error("checkpoint failed: {0}")]
    CheckpointFailure(String),

    /// Bad encryption key or tampered ciphertext. The caller falls back to
    /// treating the file as plaintext/empty.
    #[error("crypto failure: {0}")]
    CryptoFailure(String),
}
