//! Unified error types for funnies.
//!
//! Source-level variants (`HttpError`, `FetchTimeout`, `ExtractFailed`, ...) never
//! escape a synchronization pass: their display strings become the `errors` of
//! the affected comic. Only store variants cross the engine boundary.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for funnies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty source name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Expected content target not found in fetched markup.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// Requested source is not configured.
    #[error("UNKNOWN_SOURCE: {0}")]
    UnknownSource(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored value could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),
}

impl Error {
    /// Whether this error comes from the cache store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_))
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

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::ExtractFailed(msg) => (-32000, msg.clone()),
            Error::UnknownSource(name) => (-32001, format!("unknown comic: {name}")),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_) => {
                (-32603, "comic cache unavailable".to_string())
            }
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FetchTimeout("https://example.com".to_string());
        assert!(err.to_string().starts_with("FETCH_TIMEOUT"));
        assert!(err.to_string().contains("https://example.com"));
    }

    #[test]
    fn test_unknown_source_to_mcp_error() {
        let err = Error::UnknownSource("Garfield".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);
        assert!(mcp_err.message.contains("Garfield"));
    }

    #[test]
    fn test_store_errors_are_internal() {
        let err = Error::Serialization("bad json".to_string());
        assert!(err.is_store_error());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32603);
        assert!(!mcp_err.message.contains("bad json"));
    }

    #[test]
    fn test_source_errors_are_not_store_errors() {
        assert!(!Error::HttpError("HTTP 500".into()).is_store_error());
        assert!(!Error::ExtractFailed("no target".into()).is_store_error());
    }
}
