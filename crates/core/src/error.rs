//! Unified error types for dossier.
//!
//! The `Display` form of every variant starts with a stable code so that
//! failure records written to the dataset can be grouped by cause.

use tokio_rusqlite::rusqlite;

use crate::config::ConfigError;

/// Unified error types for the dossier pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Profile extraction failed for a page.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be encoded or decoded.
    #[error("STORE_ERROR: serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Navigation or request exceeded its time budget.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// HTTP error response or network failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Rendered mode requested but the binary was built without it.
    #[error("RENDER_DISABLED")]
    RenderDisabled,

    /// Headless browser failed to produce a page.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),

    /// Invalid or missing configuration; aborts the run before any work.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether this error belongs to the navigation family (timeouts,
    /// network failures, bad URLs, browser faults).
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_) | Error::FetchTimeout(_) | Error::HttpError(_) | Error::RenderFailed(_)
        )
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FetchTimeout("navigation exceeded 30000ms".to_string());
        assert!(err.to_string().starts_with("FETCH_TIMEOUT"));
        assert!(err.to_string().contains("30000ms"));
    }

    #[test]
    fn test_config_error_wraps() {
        let err: Error =
            ConfigError::Invalid { field: "urls_per_batch".into(), reason: "must be greater than 0".into() }.into();
        assert!(err.to_string().starts_with("CONFIG_ERROR"));
        assert!(err.to_string().contains("urls_per_batch"));
    }

    #[test]
    fn test_is_navigation() {
        assert!(Error::FetchTimeout("x".into()).is_navigation());
        assert!(Error::HttpError("status 503".into()).is_navigation());
        assert!(!Error::ExtractFailed("x".into()).is_navigation());
        assert!(!Error::RenderDisabled.is_navigation());
    }
}
