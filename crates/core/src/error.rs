//! Error types for the docstore document store
//!
//! One taxonomy is shared by every crate in the workspace. We use
//! `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Two variants are signals rather than failures and callers must treat
//! them as such:
//!
//! - [`Error::NotFound`] is returned for absent keys *and* for filtered
//!   reads with zero hits. An empty result set is never surfaced as an
//!   empty cursor.
//! - [`Error::Eof`] marks clean cursor exhaustion. The migration loop
//!   coerces it to success.

use std::io;
use thiserror::Error;

/// Result type alias for docstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the document store
#[derive(Debug, Error)]
pub enum Error {
    /// Key absent, or a filtered read matched zero documents
    #[error("not found")]
    NotFound,

    /// Cursor exhaustion; an expected terminal signal, not a failure
    #[error("end of rows")]
    Eof,

    /// Operation unsupported by the backend in use
    #[error("not implemented")]
    NotImplemented,

    /// Cooperative cancellation fired mid-operation
    #[error("operation cancelled")]
    Cancelled,

    /// Malformed input: bad table name, bad query clause, bad batch
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a file-backed engine
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Opaque error reported by an underlying KV or index engine
    #[error("engine error: {0}")]
    Engine(String),
}

impl Error {
    /// True for the two terminal signals that are not failures
    pub fn is_terminal_signal(&self) -> bool {
        matches!(self, Error::NotFound | Error::Eof)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
