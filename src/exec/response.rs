//! Progress-stream protocol
//!
//! The structured messages a query stream delivers to the caller. Every
//! response carries the request id established at ANALYSIS and the phase
//! it was produced in; phase-specific payloads ride in optional fields.
//! Responses are delivered strictly in phase order, never reordered,
//! never duplicated, and nothing follows a terminal response.

use crate::exec::phase::Phase;
use crate::table::Field;
use serde::{Deserialize, Serialize};

/// Analysis payload: the inferred output schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Output schema, in expression declaration order
    pub schema: Vec<Field>,
}

/// Location of one materialized output batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBatch {
    /// Dereferenceable location (URI or presigned URL per destination)
    pub path: String,
    /// Rows in this batch
    pub row_count: u64,
}

/// Cumulative progress reported with each COMPUTING response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Rows in the snapshot under the resolved token
    pub total_input_rows: u64,
    /// Rows actually processed so far (after pruning)
    pub processed_input_rows: u64,
    /// Output rows materialized so far
    pub produced_output_rows: u64,
    /// Batch artifacts written so far
    pub output_files: u64,
}

/// Final metrics, computed once at successful completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// Batch artifacts written
    pub output_files: u64,
    /// Rows in the snapshot under the resolved token
    pub total_input_rows: u64,
    /// Rows actually processed (total minus pruned)
    pub processed_input_rows: u64,
    /// Output rows materialized across all batches
    pub produced_output_rows: u64,
}

/// One message in a query's response stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Request id, stable across the whole stream
    pub request_id: String,
    /// Phase this response was produced in
    pub phase: Phase,
    /// Query id, assigned once analysis succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    /// Resolved data token id (set on the ANALYSIS response)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_token_id: Option<String>,
    /// Analysis payload (set on the ANALYSIS response)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    /// Materialized batch location (COMPUTING responses only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputBatch>,
    /// Cumulative progress (COMPUTING responses only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSnapshot>,
    /// Final metrics (SUCCESS response only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QueryMetrics>,
    /// Error description (FAILED response only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    fn base(request_id: &str, phase: Phase) -> Self {
        Self {
            request_id: request_id.to_string(),
            phase,
            query_id: None,
            data_token_id: None,
            analysis: None,
            output: None,
            progress: None,
            metrics: None,
            error: None,
        }
    }

    /// The ANALYSIS response: resolved token, inferred schema, query id.
    pub fn analysis(
        request_id: &str,
        query_id: &str,
        data_token_id: &str,
        schema: Vec<Field>,
    ) -> Self {
        Self {
            query_id: Some(query_id.to_string()),
            data_token_id: Some(data_token_id.to_string()),
            analysis: Some(AnalysisResult { schema }),
            ..Self::base(request_id, Phase::Analysis)
        }
    }

    /// The PREPARING response; carries no result data.
    pub fn preparing(request_id: &str, query_id: &str) -> Self {
        Self {
            query_id: Some(query_id.to_string()),
            ..Self::base(request_id, Phase::Preparing)
        }
    }

    /// A COMPUTING response carrying one batch and cumulative progress.
    pub fn computing(
        request_id: &str,
        query_id: &str,
        output: OutputBatch,
        progress: ProgressSnapshot,
    ) -> Self {
        Self {
            query_id: Some(query_id.to_string()),
            output: Some(output),
            progress: Some(progress),
            ..Self::base(request_id, Phase::Computing)
        }
    }

    /// The SUCCESS response carrying final metrics.
    pub fn success(request_id: &str, query_id: &str, metrics: QueryMetrics) -> Self {
        Self {
            query_id: Some(query_id.to_string()),
            metrics: Some(metrics),
            ..Self::base(request_id, Phase::Success)
        }
    }

    /// The FAILED response carrying the error description.
    ///
    /// The query id is present only if analysis had already assigned one.
    pub fn failed(request_id: &str, query_id: Option<&str>, error: &str) -> Self {
        Self {
            query_id: query_id.map(str::to_string),
            error: Some(error.to_string()),
            ..Self::base(request_id, Phase::Failed)
        }
    }
}
