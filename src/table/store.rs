//! In-memory table storage
//!
//! Append-only row storage behind the token registry. Rows are JSON
//! objects tagged with a per-table ingestion sequence; a snapshot read is
//! just "every row below a watermark", which is what makes tokens cheap:
//! a token pins a watermark, and the rows below it never change.

use crate::error::{EventideError, Result};
use crate::table::schema::TableConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// A stored input row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRow {
    /// Per-table ingestion sequence, assigned at append
    pub sequence: u64,
    /// The row cells as loaded
    pub cells: serde_json::Value,
}

/// Internal per-table state
struct TableData {
    config: TableConfig,
    rows: Vec<StoredRow>,
}

/// In-memory append-only table storage
pub struct TableStore {
    tables: RwLock<HashMap<String, TableData>>,
}

impl TableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Register a table.
    pub fn create_table(&self, config: TableConfig) -> Result<()> {
        config.validate()?;

        let mut tables = self.tables.write();
        if tables.contains_key(&config.table_name) {
            return Err(EventideError::TableAlreadyExists(config.table_name));
        }

        let name = config.table_name.clone();
        tables.insert(
            name.clone(),
            TableData {
                config,
                rows: Vec::new(),
            },
        );

        info!(table = %name, "Table created");
        Ok(())
    }

    /// Remove a table and its rows.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.remove(name).is_none() {
            return Err(EventideError::TableNotFound(name.to_string()));
        }
        info!(table = %name, "Table dropped");
        Ok(())
    }

    /// Fetch a table's configuration.
    pub fn config(&self, name: &str) -> Result<TableConfig> {
        self.tables
            .read()
            .get(name)
            .map(|t| t.config.clone())
            .ok_or_else(|| EventideError::TableNotFound(name.to_string()))
    }

    /// Append rows and return the new row watermark.
    ///
    /// Every row must be a JSON object. The watermark is the total row
    /// count after the append; a token minted against it sees exactly the
    /// rows below it.
    pub fn append(&self, name: &str, rows: Vec<serde_json::Value>) -> Result<u64> {
        for row in &rows {
            if !row.is_object() {
                return Err(EventideError::Request(format!(
                    "loaded rows must be JSON objects, got {row}"
                )));
            }
        }

        let mut tables = self.tables.write();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| EventideError::TableNotFound(name.to_string()))?;

        let appended = rows.len();
        let mut sequence = table.rows.len() as u64;
        for cells in rows {
            table.rows.push(StoredRow { sequence, cells });
            sequence += 1;
        }

        let watermark = table.rows.len() as u64;
        debug!(table = %name, rows = appended, watermark, "Rows appended");
        Ok(watermark)
    }

    /// Read the exact snapshot below a watermark.
    pub fn read_snapshot(&self, name: &str, watermark: u64) -> Result<Vec<StoredRow>> {
        let tables = self.tables.read();
        let table = tables
            .get(name)
            .ok_or_else(|| EventideError::TableNotFound(name.to_string()))?;

        let end = (watermark as usize).min(table.rows.len());
        Ok(table.rows[..end].to_vec())
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::schema::{Field, TableSchema};
    use crate::types::DataType;
    use serde_json::json;

    fn events_config() -> TableConfig {
        TableConfig {
            table_name: "events".to_string(),
            schema: TableSchema::new(vec![
                Field::new("ts", DataType::TimestampNanosecond),
                Field::new("user", DataType::String),
                Field::new("value", DataType::Int64),
            ]),
            time_column_name: "ts".to_string(),
            entity_key_column_name: "user".to_string(),
            subsort_column_name: None,
        }
    }

    #[test]
    fn test_create_and_drop() {
        let store = TableStore::new();
        store.create_table(events_config()).unwrap();
        assert!(store.create_table(events_config()).is_err());
        store.drop_table("events").unwrap();
        assert!(store.drop_table("events").is_err());
    }

    #[test]
    fn test_append_assigns_sequences() {
        let store = TableStore::new();
        store.create_table(events_config()).unwrap();

        let w1 = store
            .append("events", vec![json!({"ts": 1, "user": "a", "value": 1})])
            .unwrap();
        assert_eq!(w1, 1);

        let w2 = store
            .append(
                "events",
                vec![
                    json!({"ts": 2, "user": "a", "value": 2}),
                    json!({"ts": 3, "user": "b", "value": 3}),
                ],
            )
            .unwrap();
        assert_eq!(w2, 3);

        let rows = store.read_snapshot("events", w2).unwrap();
        let sequences: Vec<u64> = rows.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn test_snapshot_is_stable_across_appends() {
        let store = TableStore::new();
        store.create_table(events_config()).unwrap();

        let w1 = store
            .append("events", vec![json!({"ts": 1, "user": "a", "value": 1})])
            .unwrap();
        let before = store.read_snapshot("events", w1).unwrap();

        store
            .append("events", vec![json!({"ts": 2, "user": "b", "value": 2})])
            .unwrap();
        let after = store.read_snapshot("events", w1).unwrap();

        assert_eq!(before.len(), after.len());
        assert_eq!(before[0].cells, after[0].cells);
    }

    #[test]
    fn test_rejects_non_object_rows() {
        let store = TableStore::new();
        store.create_table(events_config()).unwrap();
        assert!(store.append("events", vec![json!([1, 2, 3])]).is_err());
    }

    #[test]
    fn test_unknown_table() {
        let store = TableStore::new();
        assert!(matches!(
            store.append("nope", vec![]),
            Err(EventideError::TableNotFound(_))
        ));
        assert!(store.read_snapshot("nope", 0).is_err());
        assert!(store.config("nope").is_err());
    }
}
