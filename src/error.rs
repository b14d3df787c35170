//! Error types for insightql-core.
//!
//! Minimal error types without server dependencies; every rejection carries a
//! human-readable reason string and is surfaced verbatim to the caller.

use thiserror::Error;

/// InsightQL error type
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Dataset '{0}' not found")]
    DatasetNotFound(String),

    #[error("Result too large: {0} rows exceeds the maximum of 5000")]
    ResultTooLarge(usize),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
}

impl QueryError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        QueryError::InvalidQuery(reason.into())
    }
}

/// Result type for InsightQL operations
pub type QueryResult<T> = Result<T, QueryError>;

impl serde::Serialize for QueryError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
