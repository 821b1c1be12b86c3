//! Query requests
//!
//! The caller-facing request: an expression over one table, an optional
//! explicit data token (absent means "current at analysis time"), a
//! result-retention behavior, destination configuration, and a dry-run
//! flag. Requests are immutable once submitted.

use serde::{Deserialize, Serialize};

/// Result-retention behavior for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultBehavior {
    /// Emit one output row per input change (a trace of the computation)
    #[default]
    AllResults,
    /// Emit only the last output row per entity key within the snapshot
    FinalResults,
}

/// Destination configuration for materialized batches
///
/// Batches are JSON-lines artifacts; `presign` selects presigned URLs
/// (bounded validity window) over plain URIs in COMPUTING responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Destination {
    /// Return presigned URLs instead of plain URIs
    pub presign: bool,
}

/// A query request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Table the expression reads from
    pub table: String,
    /// Record expression to compile and execute
    pub expression: String,
    /// Explicit data token id; None resolves to the table's current token
    pub data_token: Option<String>,
    /// Result-retention behavior
    pub result_behavior: ResultBehavior,
    /// Destination configuration
    pub destination: Destination,
    /// Analyze only: emit the single ANALYSIS response and stop
    pub dry_run: bool,
}

impl QueryRequest {
    /// Create a request with default options (all results, current token).
    pub fn new(table: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            expression: expression.into(),
            data_token: None,
            result_behavior: ResultBehavior::AllResults,
            destination: Destination::default(),
            dry_run: false,
        }
    }

    /// Pin the request to an explicit data token.
    pub fn with_data_token(mut self, token_id: impl Into<String>) -> Self {
        self.data_token = Some(token_id.into());
        self
    }

    /// Set the result-retention behavior.
    pub fn with_result_behavior(mut self, behavior: ResultBehavior) -> Self {
        self.result_behavior = behavior;
        self
    }

    /// Request presigned result URLs.
    pub fn with_presigned_results(mut self) -> Self {
        self.destination.presign = true;
        self
    }

    /// Mark the request as a dry run (schema-only).
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}
