//! Error types for loading observation and forecast feeds
use pest_utils::error::DateError;
use thiserror::Error;

/// Failure to retrieve or decode an observation or forecast feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Feed {url} answered with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Feed body was empty
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// Feed envelope reported failure
    #[error("Feed rejected the request: {0}")]
    Rejected(String),

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to parse JSON data
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read a local feed file
    #[error("Failed to read feed: {0}")]
    Io(#[from] std::io::Error),

    /// A record violated the data model
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Date parsing failed
    #[error(transparent)]
    DateParse(#[from] DateError),
}

/// Type alias for Results using FeedError
pub type Result<T> = std::result::Result<T, FeedError>;
