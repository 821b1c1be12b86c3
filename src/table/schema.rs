//! Table schemas and configuration
//!
//! A table declares its column schema plus the three columns the engine
//! cares about: the event-time column, the entity-key column used for
//! grouping, and an optional subsort column that breaks ties between
//! events with equal timestamps (absent that, ingestion order is used).

use crate::error::{EventideError, Result};
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name
    pub name: String,
    /// Column type
    pub data_type: DataType,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered set of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Columns, in declaration order
    pub fields: Vec<Field>,
}

impl TableSchema {
    /// Create a schema from a list of fields
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Configuration for a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Unique table name
    pub table_name: String,
    /// Column schema
    pub schema: TableSchema,
    /// Column holding the logical event time
    pub time_column_name: String,
    /// Column holding the entity key used for grouping
    pub entity_key_column_name: String,
    /// Optional column breaking ties between equal timestamps
    pub subsort_column_name: Option<String>,
}

impl TableConfig {
    /// Validate the configuration against its own schema.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(EventideError::TableConfig(
                "table name cannot be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(EventideError::TableConfig(format!(
                    "duplicate column '{}'",
                    field.name
                )));
            }
        }

        let time = self.schema.field(&self.time_column_name).ok_or_else(|| {
            EventideError::TableConfig(format!(
                "time column '{}' not in schema",
                self.time_column_name
            ))
        })?;
        if time.data_type != DataType::TimestampNanosecond {
            return Err(EventideError::TableConfig(format!(
                "time column '{}' must be TIMESTAMP_NANOSECOND, got {}",
                self.time_column_name, time.data_type
            )));
        }

        if self.schema.field(&self.entity_key_column_name).is_none() {
            return Err(EventideError::TableConfig(format!(
                "entity key column '{}' not in schema",
                self.entity_key_column_name
            )));
        }

        if let Some(subsort) = &self.subsort_column_name {
            let field = self.schema.field(subsort).ok_or_else(|| {
                EventideError::TableConfig(format!("subsort column '{subsort}' not in schema"))
            })?;
            if field.data_type != DataType::Int64 {
                return Err(EventideError::TableConfig(format!(
                    "subsort column '{subsort}' must be I64, got {}",
                    field.data_type
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchases_config() -> TableConfig {
        TableConfig {
            table_name: "purchases".to_string(),
            schema: TableSchema::new(vec![
                Field::new("id", DataType::String),
                Field::new("purchase_time", DataType::TimestampNanosecond),
                Field::new("customer_id", DataType::String),
                Field::new("amount", DataType::Int64),
                Field::new("subsort_id", DataType::Int64),
            ]),
            time_column_name: "purchase_time".to_string(),
            entity_key_column_name: "customer_id".to_string(),
            subsort_column_name: Some("subsort_id".to_string()),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(purchases_config().validate().is_ok());
    }

    #[test]
    fn test_missing_time_column() {
        let mut config = purchases_config();
        config.time_column_name = "nope".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_time_column_wrong_type() {
        let mut config = purchases_config();
        config.time_column_name = "amount".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_entity_column() {
        let mut config = purchases_config();
        config.entity_key_column_name = "nope".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_subsort_must_be_int() {
        let mut config = purchases_config();
        config.subsort_column_name = Some("customer_id".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_column() {
        let mut config = purchases_config();
        config
            .schema
            .fields
            .push(Field::new("amount", DataType::Int64));
        assert!(config.validate().is_err());
    }
}
