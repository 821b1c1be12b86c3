//! Error types for Eventide
//!
//! This module defines the main error type used throughout Eventide. The
//! variants follow the engine's failure taxonomy: request errors (rejected
//! while resolving tables and tokens), analysis errors (deterministic and
//! never retried), data errors (a row failed schema coercion during
//! compute), materialization errors (output storage), and cancellation
//! (caller dropped the response stream — never reported as a failure).

use thiserror::Error;

/// Result type alias for Eventide operations
pub type Result<T> = std::result::Result<T, EventideError>;

/// Main error type for Eventide
#[derive(Error, Debug)]
pub enum EventideError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Invalid table configuration: {0}")]
    TableConfig(String),

    #[error("Unknown data token '{token}' for table '{table}'")]
    UnknownToken { table: String, token: String },

    #[error("Invalid request: {0}")]
    Request(String),

    #[error("Analysis error: {0}")]
    Analysis(#[from] crate::query::AnalysisError),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Materialization error: {0}")]
    Materialization(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Expired presigned URL: {0}")]
    ExpiredUrl(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Query cancelled")]
    Cancelled,
}

impl EventideError {
    /// Create a data error for a row that failed schema coercion.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a materialization error.
    pub fn materialization(msg: impl Into<String>) -> Self {
        Self::Materialization(msg.into())
    }

    /// Whether this error is terminal for a query request.
    ///
    /// Every terminal error produces exactly one FAILED response on the
    /// stream. Cancellation is not terminal in that sense: the stream
    /// simply ends without a FAILED response.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EventideError::TableNotFound("purchases".to_string());
        assert_eq!(err.to_string(), "Table not found: purchases");

        let err = EventideError::UnknownToken {
            table: "purchases".to_string(),
            token: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown data token 'abc' for table 'purchases'"
        );
    }

    #[test]
    fn test_cancelled_is_not_terminal() {
        assert!(!EventideError::Cancelled.is_terminal());
        assert!(EventideError::data("bad cell").is_terminal());
        assert!(EventideError::materialization("store down").is_terminal());
    }
}
