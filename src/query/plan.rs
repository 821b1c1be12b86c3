//! Compiled query plans
//!
//! A plan is the analyzer's output: the table it scans, the output fields
//! in declaration order, and each field's resolved column, aggregate, and
//! inferred type. Plans are pure data — the aggregation engine interprets
//! them against a snapshot.

use crate::table::Field;
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// Aggregate function applied to a column over an entity's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    /// Running maximum
    Max,
    /// Running minimum
    Min,
    /// Running sum
    Sum,
    /// Count of non-null inputs
    Count,
    /// Most recent non-null input
    Last,
}

impl AggregateFunction {
    /// Resolve an aggregate by its name in the expression language.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "sum" => Some(Self::Sum),
            "count" => Some(Self::Count),
            "last" => Some(Self::Last),
            _ => None,
        }
    }

    /// Whether the aggregate requires a numeric input column.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, Self::Max | Self::Min | Self::Sum)
    }

    /// Output type of the aggregate given its input column type.
    pub fn output_type(&self, input: DataType) -> DataType {
        match self {
            Self::Count => DataType::Int64,
            Self::Max | Self::Min | Self::Sum | Self::Last => input,
        }
    }
}

/// One resolved output field of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanField {
    /// Output field name
    pub name: String,
    /// Source column name
    pub column: String,
    /// Source column type
    pub column_type: DataType,
    /// Aggregate applied over the entity's history, if any
    pub aggregate: Option<AggregateFunction>,
    /// Inferred output type
    pub data_type: DataType,
}

/// A typed, executable query plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Table the plan scans
    pub table: String,
    /// Output fields in declaration order
    pub fields: Vec<PlanField>,
}

impl QueryPlan {
    /// The inferred output schema, in field declaration order.
    pub fn output_schema(&self) -> Vec<Field> {
        self.fields
            .iter()
            .map(|f| Field::new(f.name.clone(), f.data_type))
            .collect()
    }

    /// Whether any field aggregates over entity history.
    pub fn has_aggregates(&self) -> bool {
        self.fields.iter().any(|f| f.aggregate.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_names() {
        assert_eq!(AggregateFunction::from_name("max"), Some(AggregateFunction::Max));
        assert_eq!(AggregateFunction::from_name("count"), Some(AggregateFunction::Count));
        assert_eq!(AggregateFunction::from_name("median"), None);
    }

    #[test]
    fn test_output_types() {
        assert_eq!(
            AggregateFunction::Count.output_type(DataType::String),
            DataType::Int64
        );
        assert_eq!(
            AggregateFunction::Max.output_type(DataType::Int64),
            DataType::Int64
        );
        assert_eq!(
            AggregateFunction::Last.output_type(DataType::String),
            DataType::String
        );
    }

    #[test]
    fn test_output_schema_order() {
        let plan = QueryPlan {
            table: "t".to_string(),
            fields: vec![
                PlanField {
                    name: "b".to_string(),
                    column: "x".to_string(),
                    column_type: DataType::Int64,
                    aggregate: Some(AggregateFunction::Sum),
                    data_type: DataType::Int64,
                },
                PlanField {
                    name: "a".to_string(),
                    column: "y".to_string(),
                    column_type: DataType::String,
                    aggregate: None,
                    data_type: DataType::String,
                },
            ],
        };
        let names: Vec<String> = plan.output_schema().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(plan.has_aggregates());
    }
}
