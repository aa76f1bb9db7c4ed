//! Unified error types for postgrid.
//!
//! Only [`Error::RateLimited`] and [`Error::Forbidden`] are expected to reach
//! an HTTP caller. Cache and content-source failures are absorbed by the
//! components that hit them.

use tokio_rusqlite::rusqlite;

/// Unified error types for the postgrid service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an unparseable event body).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The client exhausted its request window.
    #[error("RATE_LIMITED: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The viewer lacks the capability required for the operation.
    #[error("FORBIDDEN: {0}")]
    Forbidden(String),

    /// The external content store failed.
    #[error("CONTENT_SOURCE: {0}")]
    ContentSource(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A payload could not be serialized for caching.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// Machine-readable error code exposed to HTTP callers.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::RateLimited { .. } => "rate_limit_exceeded",
            Error::Forbidden(_) => "forbidden",
            Error::ContentSource(_) => "content_source_error",
            Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_) => "cache_error",
        }
    }

    /// HTTP status class for this error.
    pub fn status(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            Error::RateLimited { .. } => 429,
            Error::Forbidden(_) => 403,
            Error::ContentSource(_) => 502,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_) => 500,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
