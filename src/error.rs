//! Error types for the rip catalog.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the rip catalog.
#[derive(Error, Debug)]
pub enum Error {
    // Parse errors
    #[error("Failed to parse filename: {0}")]
    Parse(String),

    // Matching errors
    #[error("No matching movie found for '{0}'")]
    NoMatch(String),

    #[error("Multiple movies match '{title}': {}", .candidates.join(", "))]
    MultipleMatch {
        title: String,
        candidates: Vec<String>,
    },

    // Remote errors
    #[error("Rate limit exceeded, retry after {}ms", .retry_after.as_millis())]
    RateLimitExceeded { retry_after: Duration },

    #[error("Not found on metadata service: {0}")]
    NotFound(String),

    #[error("Metadata service throttled the request")]
    Throttled,

    #[error("Metadata service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("TMDB API key not configured. Set TMDB_API_KEY or tmdb.api_key in config.toml")]
    TmdbApiKeyMissing,

    // Settings and storage errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Catalog store error: {0}")]
    Store(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // TOML errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Whether a batch run may record this error against a single item and
    /// carry on with the next one.
    ///
    /// Everything else aborts the run before anything is committed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Parse(_)
                | Error::NoMatch(_)
                | Error::MultipleMatch { .. }
                | Error::RateLimitExceeded { .. }
                | Error::NotFound(_)
        )
    }
}
