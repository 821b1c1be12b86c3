#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # Eventide
//!
//! Eventide is a temporal query engine for append-only event tables.
//! Queries bind to an immutable snapshot of a table's data via a *data
//! token*, execute through an explicit phase machine, and stream
//! materialized result batches back to the caller.
//!
//! ## Features
//!
//! - **Data tokens**: every load commits a new, strictly-ordered token;
//!   querying an old token reproduces its snapshot exactly, regardless
//!   of later loads.
//! - **Streaming execution**: responses arrive in strict phase order
//!   (`ANALYSIS → PREPARING → COMPUTING* → SUCCESS | FAILED`), each
//!   COMPUTING response carrying one materialized batch location.
//! - **Two retention behaviors**: `ALL_RESULTS` traces every change per
//!   entity; `FINAL_RESULTS` reduces the same trace to the last row per
//!   entity, so the two provably agree.
//! - **Dry runs**: schema-only analysis with a single-response stream.
//! - **Presigned results**: batch locations can be presigned URLs with a
//!   bounded validity window.
//!
//! ## Quick start
//!
//! ```no_run
//! use eventide::{DataType, Eventide, Field, QueryRequest, TableConfig, TableSchema};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> eventide::Result<()> {
//!     let engine = Eventide::in_memory()?;
//!     engine.create_table(TableConfig {
//!         table_name: "purchases".to_string(),
//!         schema: TableSchema::new(vec![
//!             Field::new("purchase_time", DataType::TimestampNanosecond),
//!             Field::new("customer_id", DataType::String),
//!             Field::new("amount", DataType::Int64),
//!         ]),
//!         time_column_name: "purchase_time".to_string(),
//!         entity_key_column_name: "customer_id".to_string(),
//!         subsort_column_name: None,
//!     })?;
//!
//!     engine.load(
//!         "purchases",
//!         vec![json!({"purchase_time": 1, "customer_id": "karen", "amount": 9})],
//!     )?;
//!
//!     let mut stream = engine.create_query(QueryRequest::new(
//!         "purchases",
//!         "{ time: purchases.purchase_time, entity: purchases.customer_id, \
//!            max_amount: purchases.amount | max() }",
//!     ));
//!     while let Some(response) = stream.recv().await {
//!         println!("{}: {:?}", response.phase, response.output);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────────────┐
//! │ QueryRequest  │──▶│ QueryDriver   │──▶│ Response stream     │
//! │ (expression,  │   │ (phase machine)│   │ (mpsc, phase order) │
//! │  token, ...)  │   └──────┬────────┘   └─────────────────────┘
//! └──────────────┘          │
//!            ┌──────────────┼────────────────┐
//!            ▼              ▼                ▼
//!     ┌────────────┐ ┌─────────────┐ ┌──────────────────┐
//!     │ TokenRegistry│ │ Aggregation │ │ ResultMaterializer│
//!     │ + TableStore │ │ Engine      │ │ + ObjectStore     │
//!     └────────────┘ └─────────────┘ └──────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod exec;
pub mod output;
pub mod query;
pub mod service;
pub mod table;
pub mod types;

pub use config::EngineConfig;
pub use error::{EventideError, Result};
pub use exec::{
    Destination, OutputBatch, Phase, ProgressSnapshot, QueryMetrics, QueryRequest, QueryResponse,
    ResultBehavior,
};
pub use query::{analyze, AggregateFunction, AnalysisError, QueryPlan};
pub use service::Eventide;
pub use table::{DataToken, Field, TableConfig, TableSchema};
pub use types::{DataType, Value};
