//! Result materialization
//!
//! Writes batches of output rows as JSON-lines artifacts in output
//! storage, one artifact per batch, and computes the final metrics once
//! the engine signals exhaustion. Transient storage failures are retried
//! a bounded number of times before escalating to a terminal
//! materialization error; nothing else in the engine retries.

use crate::config::EngineConfig;
use crate::error::{EventideError, Result};
use crate::exec::aggregate::{OutputRow, ScanStats};
use crate::exec::request::Destination;
use crate::exec::response::{OutputBatch, ProgressSnapshot, QueryMetrics};
use crate::output::ObjectStore;
use crate::query::QueryPlan;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

/// Writes output batches and accounts for produced rows
pub struct ResultMaterializer {
    store: Arc<dyn ObjectStore>,
    destination: Destination,
    /// Key prefix for this request's artifacts (the query id)
    prefix: String,
    max_retries: u32,
    presign_validity_secs: u64,
    files_written: u64,
    rows_written: u64,
}

impl ResultMaterializer {
    /// Create a materializer for one request.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        destination: Destination,
        query_id: &str,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            destination,
            prefix: query_id.to_string(),
            max_retries: config.max_write_retries,
            presign_validity_secs: config.presign_validity_secs,
            files_written: 0,
            rows_written: 0,
        }
    }

    /// Serialize one batch to a new artifact and return its location.
    ///
    /// Batch-to-file is one-to-one: batches are never merged with prior
    /// batches.
    pub fn write_batch(&mut self, rows: &[OutputRow], plan: &QueryPlan) -> Result<OutputBatch> {
        let mut body = String::new();
        for row in rows {
            let line = serde_json::to_string(&row.to_json(plan))?;
            body.push_str(&line);
            body.push('\n');
        }

        let key = format!("{}/results-{}.jsonl", self.prefix, self.files_written);
        let data = Bytes::from(body);

        let mut attempt = 0;
        let uri = loop {
            match self.store.put(&key, data.clone()) {
                Ok(uri) => break uri,
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        key = %key,
                        attempt,
                        error = %e,
                        "Batch write failed, retrying"
                    );
                }
                Err(e) => {
                    return Err(EventideError::materialization(format!(
                        "writing batch '{key}' failed after {attempt} retries: {e}"
                    )))
                }
            }
        };

        let path = if self.destination.presign {
            self.store.presign(&uri, self.presign_validity_secs)?
        } else {
            uri
        };

        self.files_written += 1;
        self.rows_written += rows.len() as u64;
        debug!(path = %path, rows = rows.len(), "Batch materialized");

        Ok(OutputBatch {
            path,
            row_count: rows.len() as u64,
        })
    }

    /// Cumulative progress for the latest COMPUTING response.
    pub fn progress(&self, stats: &ScanStats) -> ProgressSnapshot {
        ProgressSnapshot {
            total_input_rows: stats.total_input_rows,
            processed_input_rows: stats.processed_input_rows,
            produced_output_rows: self.rows_written,
            output_files: self.files_written,
        }
    }

    /// Compute final metrics. The only place metrics are computed; called
    /// exactly once, after all batches are written.
    pub fn finalize(self, stats: &ScanStats) -> QueryMetrics {
        QueryMetrics {
            output_files: self.files_written,
            total_input_rows: stats.total_input_rows,
            processed_input_rows: stats.processed_input_rows,
            produced_output_rows: self.rows_written,
        }
    }
}
