//! Incremental aggregation engine
//!
//! Executes a compiled plan against exactly the rows visible under a
//! resolved data token. Rows are scanned in `(event time, subsort)` order
//! — subsort being the table's configured tie-break column, falling back
//! to ingestion sequence — and per-entity accumulator state is updated
//! row by row. Every processed input row emits one output row carrying
//! the entity's aggregate values as of that row: the ALL_RESULTS trace.
//!
//! FINAL_RESULTS is a reduction over that same trace (keep the last row
//! per entity key, emit in time order), never a separate computation, so
//! the two behaviors agree by construction.

use crate::error::{EventideError, Result};
use crate::exec::request::ResultBehavior;
use crate::query::{AggregateFunction, QueryPlan};
use crate::table::{StoredRow, TableConfig};
use crate::types::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Input-row accounting for a single execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Rows in the snapshot
    pub total_input_rows: u64,
    /// Rows processed (total minus rows pruned for null time or entity)
    pub processed_input_rows: u64,
}

/// One computed output row
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    /// Ordering key of the input row that produced this output
    order_key: (i64, i64),
    /// Canonical entity key (JSON encoding of the entity cell)
    entity_key: String,
    /// Output cells, aligned with the plan's fields
    cells: Vec<Value>,
}

impl OutputRow {
    /// Serialize as a JSON object in the plan's field order.
    pub fn to_json(&self, plan: &QueryPlan) -> serde_json::Value {
        let mut object = serde_json::Map::with_capacity(self.cells.len());
        for (field, cell) in plan.fields.iter().zip(&self.cells) {
            object.insert(field.name.clone(), cell.to_json());
        }
        serde_json::Value::Object(object)
    }
}

/// The result of executing a plan against a snapshot
#[derive(Debug, Clone)]
pub struct ExecutionTrace {
    /// Output rows, in emission order
    pub rows: Vec<OutputRow>,
    /// Input-row accounting
    pub stats: ScanStats,
}

/// Running aggregate state for one plan field of one entity
#[derive(Debug, Clone)]
enum Accumulator {
    Max(Option<Value>),
    Min(Option<Value>),
    Sum(Option<Value>),
    Count(u64),
    Last(Option<Value>),
}

impl Accumulator {
    fn new(function: AggregateFunction) -> Self {
        match function {
            AggregateFunction::Max => Self::Max(None),
            AggregateFunction::Min => Self::Min(None),
            AggregateFunction::Sum => Self::Sum(None),
            AggregateFunction::Count => Self::Count(0),
            AggregateFunction::Last => Self::Last(None),
        }
    }

    /// Fold one input cell into the state. Nulls are the identity for
    /// every aggregate.
    fn update(&mut self, input: &Value) {
        if input.is_null() {
            return;
        }
        match self {
            Self::Max(state) => {
                let replace = match state {
                    Some(current) => {
                        current.partial_cmp_same_type(input) == Some(Ordering::Less)
                    }
                    None => true,
                };
                if replace {
                    *state = Some(input.clone());
                }
            }
            Self::Min(state) => {
                let replace = match state {
                    Some(current) => {
                        current.partial_cmp_same_type(input) == Some(Ordering::Greater)
                    }
                    None => true,
                };
                if replace {
                    *state = Some(input.clone());
                }
            }
            Self::Sum(state) => {
                *state = Some(match state.take() {
                    None => input.clone(),
                    Some(Value::Int64(a)) => match input {
                        Value::Int64(b) => Value::Int64(a.saturating_add(*b)),
                        _ => Value::Int64(a),
                    },
                    Some(Value::Float64(a)) => match input {
                        Value::Float64(b) => Value::Float64(a + b),
                        _ => Value::Float64(a),
                    },
                    Some(Value::Timestamp(a)) => match input {
                        Value::Timestamp(b) => Value::Timestamp(a.saturating_add(*b)),
                        _ => Value::Timestamp(a),
                    },
                    Some(other) => other,
                });
            }
            Self::Count(count) => *count += 1,
            Self::Last(state) => *state = Some(input.clone()),
        }
    }

    fn current(&self) -> Value {
        match self {
            Self::Max(state) | Self::Min(state) | Self::Sum(state) | Self::Last(state) => {
                state.clone().unwrap_or(Value::Null)
            }
            Self::Count(count) => Value::Int64(*count as i64),
        }
    }
}

/// A coerced, ordered input row ready for accumulation
struct ScanRow {
    order_key: (i64, i64),
    entity_key: String,
    /// One coerced cell per plan field (the field's source column)
    inputs: Vec<Value>,
}

/// Executes compiled plans against snapshots
pub struct AggregationEngine {
    plan: QueryPlan,
    table: TableConfig,
}

impl AggregationEngine {
    /// Create an engine for one plan over one table.
    pub fn new(plan: QueryPlan, table: TableConfig) -> Self {
        Self { plan, table }
    }

    /// Execute against a snapshot under the requested retention behavior.
    pub fn execute(
        &self,
        rows: &[StoredRow],
        behavior: ResultBehavior,
    ) -> Result<ExecutionTrace> {
        let mut stats = ScanStats {
            total_input_rows: rows.len() as u64,
            processed_input_rows: 0,
        };

        let mut scan = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(scan_row) = self.coerce_row(row)? {
                scan.push(scan_row);
            }
        }
        stats.processed_input_rows = scan.len() as u64;
        scan.sort_by_key(|r| r.order_key);

        // One pass builds the ALL_RESULTS trace.
        let mut states: HashMap<String, Vec<Accumulator>> = HashMap::new();
        let mut trace = Vec::with_capacity(scan.len());
        for row in scan {
            let accumulators = states.entry(row.entity_key.clone()).or_insert_with(|| {
                self.plan
                    .fields
                    .iter()
                    .map(|f| {
                        f.aggregate
                            .map(Accumulator::new)
                            .unwrap_or(Accumulator::Last(None))
                    })
                    .collect()
            });

            let mut cells = Vec::with_capacity(self.plan.fields.len());
            for ((field, accumulator), input) in self
                .plan
                .fields
                .iter()
                .zip(accumulators.iter_mut())
                .zip(&row.inputs)
            {
                if field.aggregate.is_some() {
                    accumulator.update(input);
                    cells.push(accumulator.current());
                } else {
                    cells.push(input.clone());
                }
            }

            trace.push(OutputRow {
                order_key: row.order_key,
                entity_key: row.entity_key,
                cells,
            });
        }

        let rows = match behavior {
            ResultBehavior::AllResults => trace,
            ResultBehavior::FinalResults => Self::reduce_to_final(trace),
        };

        Ok(ExecutionTrace { rows, stats })
    }

    /// Keep only the last trace row per entity key, in time order.
    fn reduce_to_final(trace: Vec<OutputRow>) -> Vec<OutputRow> {
        let mut last: HashMap<String, OutputRow> = HashMap::new();
        for row in trace {
            last.insert(row.entity_key.clone(), row);
        }
        let mut rows: Vec<OutputRow> = last.into_values().collect();
        rows.sort_by(|a, b| {
            a.order_key
                .cmp(&b.order_key)
                .then_with(|| a.entity_key.cmp(&b.entity_key))
        });
        rows
    }

    /// Coerce one stored row; `None` means the row is pruned.
    fn coerce_row(&self, row: &StoredRow) -> Result<Option<ScanRow>> {
        let cells = row.cells.as_object().ok_or_else(|| {
            EventideError::data(format!("row {} is not an object", row.sequence))
        })?;

        let coerce = |column: &str| -> Result<Value> {
            let field = self.table.schema.field(column).ok_or_else(|| {
                EventideError::data(format!("column '{column}' missing from schema"))
            })?;
            Value::coerce(cells.get(column), field.data_type).map_err(|e| {
                EventideError::data(format!(
                    "row {} column '{column}': {e}",
                    row.sequence
                ))
            })
        };

        let time = coerce(&self.table.time_column_name)?;
        let entity = coerce(&self.table.entity_key_column_name)?;

        // Rows without a time or an entity cannot be placed or grouped.
        let Value::Timestamp(time) = time else {
            return Ok(None);
        };
        if entity.is_null() {
            return Ok(None);
        }

        // Tie-break: configured subsort column when present (null cells
        // fall back to ingestion sequence), else ingestion sequence.
        let subsort = match &self.table.subsort_column_name {
            Some(column) => match coerce(column)? {
                Value::Int64(n) => n,
                _ => row.sequence as i64,
            },
            None => row.sequence as i64,
        };

        let mut inputs = Vec::with_capacity(self.plan.fields.len());
        for field in &self.plan.fields {
            inputs.push(coerce(&field.column)?);
        }

        Ok(Some(ScanRow {
            order_key: (time, subsort),
            entity_key: entity.to_json().to_string(),
            inputs,
        }))
    }
}
