//! Query analysis
//!
//! Type-checks a record expression against a table's schema and produces
//! an executable [`QueryPlan`] with its inferred output schema. Analysis
//! is a pure function of the expression and the schema — it never touches
//! token state, so the same expression against the same schema always
//! infers the same output schema. Analysis errors are deterministic and
//! terminal for the request; nothing here is retried.

use crate::query::expr;
use crate::query::plan::{AggregateFunction, PlanField, QueryPlan};
use crate::table::TableConfig;
use std::collections::HashSet;
use thiserror::Error;

/// Errors produced by query analysis
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("unknown field '{table}.{column}'")]
    UnknownField { table: String, column: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("duplicate output field '{0}'")]
    DuplicateField(String),
}

/// Analyze an expression against a table, producing a typed plan.
pub fn analyze(expression: &str, table: &TableConfig) -> Result<QueryPlan, AnalysisError> {
    let record = expr::parse(expression).map_err(|e| AnalysisError::Syntax(e.to_string()))?;

    let mut fields = Vec::with_capacity(record.fields.len());
    let mut names = HashSet::new();

    for field in record.fields {
        if !names.insert(field.name.clone()) {
            return Err(AnalysisError::DuplicateField(field.name));
        }

        let value = field.value;
        if value.table != table.table_name {
            return Err(AnalysisError::UnknownTable(value.table));
        }

        let column = table.schema.field(&value.column).ok_or_else(|| {
            AnalysisError::UnknownField {
                table: value.table.clone(),
                column: value.column.clone(),
            }
        })?;

        let aggregate = match value.aggregate.as_deref() {
            None => None,
            Some(name) => Some(
                AggregateFunction::from_name(name)
                    .ok_or_else(|| AnalysisError::UnknownFunction(name.to_string()))?,
            ),
        };

        if let Some(agg) = aggregate {
            if agg.requires_numeric() && !column.data_type.is_numeric() {
                return Err(AnalysisError::TypeMismatch(format!(
                    "{agg:?} requires a numeric column, but '{}' is {}",
                    column.name, column.data_type
                )));
            }
        }

        let data_type = match aggregate {
            Some(agg) => agg.output_type(column.data_type),
            None => column.data_type,
        };

        fields.push(PlanField {
            name: field.name,
            column: value.column,
            column_type: column.data_type,
            aggregate,
            data_type,
        });
    }

    Ok(QueryPlan {
        table: table.table_name.clone(),
        fields,
    })
}
