//! Query compilation: expression parsing and analysis

mod analyzer;
mod expr;
mod plan;

pub use analyzer::{analyze, AnalysisError};
pub use expr::{parse, FieldExpr, ParseError, RecordExpr, RecordField};
pub use plan::{AggregateFunction, PlanField, QueryPlan};
