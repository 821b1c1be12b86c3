//! Query execution: the phase machine, the aggregation engine, result
//! materialization, and the progress-stream protocol

mod aggregate;
mod driver;
mod materializer;
mod phase;
mod request;
mod response;

pub use aggregate::{AggregationEngine, ExecutionTrace, OutputRow, ScanStats};
pub use materializer::ResultMaterializer;
pub use phase::Phase;
pub use request::{Destination, QueryRequest, ResultBehavior};
pub use response::{
    AnalysisResult, OutputBatch, ProgressSnapshot, QueryMetrics, QueryResponse,
};

pub(crate) use driver::QueryDriver;
