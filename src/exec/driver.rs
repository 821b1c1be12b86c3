//! Query execution driver
//!
//! One driver runs one request: it resolves the data token, analyzes the
//! expression, executes the aggregation engine, and streams responses to
//! the caller in strict phase order. The driver owns the request context
//! (request id, query id, current phase, progress) for the lifetime of
//! the stream and is the only component that emits responses.
//!
//! Cancellation is the caller dropping its receiver: the channel closes,
//! the driver abandons remaining work without emitting anything further,
//! and artifacts written for unsent batches are never referenced by a
//! completed stream.

use crate::config::EngineConfig;
use crate::error::{EventideError, Result};
use crate::exec::aggregate::AggregationEngine;
use crate::exec::materializer::ResultMaterializer;
use crate::exec::phase::Phase;
use crate::exec::request::QueryRequest;
use crate::exec::response::QueryResponse;
use crate::output::ObjectStore;
use crate::query::analyze;
use crate::table::{TableStore, TokenRegistry};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(crate) struct QueryDriver {
    store: Arc<TableStore>,
    registry: Arc<TokenRegistry>,
    objects: Arc<dyn ObjectStore>,
    config: EngineConfig,
    tx: mpsc::Sender<QueryResponse>,
    request_id: String,
    query_id: Option<String>,
    phase: Phase,
}

impl QueryDriver {
    pub(crate) fn new(
        store: Arc<TableStore>,
        registry: Arc<TokenRegistry>,
        objects: Arc<dyn ObjectStore>,
        config: EngineConfig,
        tx: mpsc::Sender<QueryResponse>,
    ) -> Self {
        Self {
            store,
            registry,
            objects,
            config,
            tx,
            request_id: uuid::Uuid::new_v4().to_string(),
            query_id: None,
            phase: Phase::initial(),
        }
    }

    /// Drive the request to a terminal phase (or until cancelled).
    pub(crate) async fn run(mut self, request: QueryRequest) {
        match self.execute(request).await {
            Ok(()) => {}
            Err(EventideError::Cancelled) => {
                debug!(request_id = %self.request_id, "Query stream cancelled by caller");
            }
            Err(error) => self.fail(&error).await,
        }
    }

    async fn execute(&mut self, request: QueryRequest) -> Result<()> {
        // ANALYSIS: resolve the token, compile the plan, assign the
        // query id, and emit the schema.
        let table = self.store.config(&request.table)?;
        let token = self
            .registry
            .resolve(&request.table, request.data_token.as_deref())?;
        let plan = analyze(&request.expression, &table)?;

        let query_id = uuid::Uuid::new_v4().to_string();
        self.query_id = Some(query_id.clone());
        info!(
            request_id = %self.request_id,
            query_id = %query_id,
            table = %request.table,
            data_token = %token.token_id,
            dry_run = request.dry_run,
            "Query analyzed"
        );

        self.send(QueryResponse::analysis(
            &self.request_id,
            &query_id,
            &token.token_id,
            plan.output_schema(),
        ))
        .await?;

        if request.dry_run {
            return Ok(());
        }

        // PREPARING: pin the snapshot and allocate output.
        self.advance(Phase::Preparing)?;
        let rows = self
            .store
            .read_snapshot(&request.table, token.row_watermark)?;
        let mut materializer = ResultMaterializer::new(
            self.objects.clone(),
            request.destination,
            &query_id,
            &self.config,
        );
        self.send(QueryResponse::preparing(&self.request_id, &query_id))
            .await?;

        // COMPUTING: execute and stream one response per batch.
        self.advance(Phase::Computing)?;
        let engine = AggregationEngine::new(plan.clone(), table);
        let trace = engine.execute(&rows, request.result_behavior)?;

        for chunk in trace.rows.chunks(self.config.batch_size) {
            if self.tx.is_closed() {
                return Err(EventideError::Cancelled);
            }
            let batch = materializer.write_batch(chunk, &plan)?;
            let progress = materializer.progress(&trace.stats);
            self.send(QueryResponse::computing(
                &self.request_id,
                &query_id,
                batch,
                progress,
            ))
            .await?;
        }

        // SUCCESS: final metrics, computed once, after every batch.
        let metrics = materializer.finalize(&trace.stats);
        self.advance(Phase::Success)?;
        info!(
            request_id = %self.request_id,
            query_id = %query_id,
            output_files = metrics.output_files,
            produced_output_rows = metrics.produced_output_rows,
            "Query succeeded"
        );
        self.send(QueryResponse::success(&self.request_id, &query_id, metrics))
            .await?;
        Ok(())
    }

    /// Move to the next phase, enforcing the transition function.
    fn advance(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_transition(next) {
            return Err(EventideError::Request(format!(
                "illegal phase transition {} -> {next}",
                self.phase
            )));
        }
        self.phase = next;
        Ok(())
    }

    /// Emit the single FAILED response and close the stream.
    async fn fail(&mut self, error: &EventideError) {
        if self.phase.is_terminal() || !self.phase.can_transition(Phase::Failed) {
            return;
        }
        self.phase = Phase::Failed;
        warn!(
            request_id = %self.request_id,
            error = %error,
            "Query failed"
        );

        let response =
            QueryResponse::failed(&self.request_id, self.query_id.as_deref(), &error.to_string());
        // The caller may already be gone; a failed send is just cancellation.
        let _ = self.tx.send(response).await;
    }

    async fn send(&mut self, response: QueryResponse) -> Result<()> {
        self.tx
            .send(response)
            .await
            .map_err(|_| EventideError::Cancelled)
    }
}
