//! Error types for rss-dl
//!
//! Only two classes of failure abort a run: the ledger becoming unavailable
//! ([`DatabaseError`]) and unrecoverable configuration errors. Everything
//! else — fetch failures, malformed torrents, exclusive-write races — is
//! handled per URL and surfaced as an outcome value, never propagated as a
//! fatal error.

use thiserror::Error;

/// Result type alias for rss-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rss-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "target_dir")
        key: Option<String>,
    },

    /// Ledger database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Network or transport failure while fetching a torrent
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A torrent or webhook URL could not be parsed
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Fetched payload was not a decodable torrent
    #[error("invalid torrent: {0}")]
    InvalidTorrent(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Report notification delivery failed
    #[error("notification error: {0}")]
    Notification(String),
}

/// Ledger database errors
///
/// Any of these means the ledger can no longer be trusted to track progress,
/// so they abort the whole run.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open the ledger database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or migrate the ledger schema
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this error should abort the whole run
    ///
    /// Per-URL failures (fetch, decode) are recoverable; ledger and
    /// configuration errors are not.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Config { .. })
    }
}
