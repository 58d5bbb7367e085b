//! Typed errors for the catalog library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can
//! match on the failure kind, e.g. to map it onto an HTTP status.

use thiserror::Error;

/// Errors raised by stores, ingestion and comparison.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A uniqueness constraint would be violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// A scraped record is malformed
    #[error("invalid offering spec: {reason}")]
    InvalidSpec { reason: String },

    /// A single entity lookup found nothing
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A comparison request matched no active offerings
    #[error("no active offerings found for: {}", requested.join(", "))]
    ModelsNotFound { requested: Vec<String> },

    /// A comparison usage scenario cannot be evaluated
    #[error("invalid usage scenario: {0}")]
    InvalidUsage(String),
}

impl CatalogError {
    pub fn storage(message: impl Into<String>) -> Self {
        CatalogError::Storage(message.into().into())
    }
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => CatalogError::Conflict(db.message().to_string()),
            _ => CatalogError::Storage(Box::new(err)),
        }
    }
}

/// Errors a scraper may raise while extracting offerings.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The scraper could not be constructed
    #[error("scraper construction failed: {0}")]
    Construction(String),

    /// Fetching the source failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Reading a local source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source payload was not valid JSON for the expected shape
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The source payload parsed but made no sense
    #[error("parse error: {0}")]
    Parse(String),

    /// The scraper task panicked or was aborted
    #[error("scraper task aborted: {0}")]
    Aborted(String),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for scraper operations.
pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;
