//! Embedded Eventide engine
//!
//! The high-level API for using Eventide as a library: register tables,
//! load rows (each load commits a new data token), and submit queries
//! whose responses stream back over a channel.
//!
//! # Example
//!
//! ```no_run
//! use eventide::{DataType, Eventide, Field, QueryRequest, TableConfig, TableSchema};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> eventide::Result<()> {
//!     let engine = Eventide::in_memory()?;
//!
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
//!     let token = engine.load(
//!         "purchases",
//!         vec![json!({"purchase_time": 1, "customer_id": "karen", "amount": 9})],
//!     )?;
//!     println!("committed token: {}", token.token_id);
//!
//!     let mut stream = engine.create_query(QueryRequest::new(
//!         "purchases",
//!         "{ entity: purchases.customer_id, max_amount: purchases.amount | max() }",
//!     ));
//!     while let Some(response) = stream.recv().await {
//!         println!("{:?} {:?}", response.phase, response.output);
//!     }
//!     Ok(())
//! }
//! ```

use crate::config::EngineConfig;
use crate::error::Result;
use crate::exec::{QueryDriver, QueryRequest, QueryResponse};
use crate::output::{FsObjectStore, MemoryObjectStore, ObjectStore};
use crate::table::{DataToken, TableConfig, TableStore, TokenRegistry};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Embedded Eventide engine instance
pub struct Eventide {
    store: Arc<TableStore>,
    registry: Arc<TokenRegistry>,
    objects: Arc<dyn ObjectStore>,
    config: EngineConfig,
    /// Serializes append-then-commit so token order matches append order.
    load_lock: Mutex<()>,
}

impl Eventide {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let objects: Arc<dyn ObjectStore> = match &config.data_dir {
            Some(dir) => Arc::new(FsObjectStore::new(dir.clone())?),
            None => Arc::new(MemoryObjectStore::new()),
        };

        Ok(Self {
            store: Arc::new(TableStore::new()),
            registry: Arc::new(TokenRegistry::new()),
            objects,
            config,
            load_lock: Mutex::new(()),
        })
    }

    /// Create an engine keeping batch artifacts in memory.
    pub fn in_memory() -> Result<Self> {
        Self::new(EngineConfig::in_memory())
    }

    /// Register a table and return its genesis (empty-snapshot) token.
    pub fn create_table(&self, config: TableConfig) -> Result<DataToken> {
        let name = config.table_name.clone();
        self.store.create_table(config)?;
        match self.registry.register_table(&name) {
            Ok(genesis) => Ok(genesis),
            Err(e) => {
                // Keep store and registry in step if registration races.
                let _ = self.store.drop_table(&name);
                Err(e)
            }
        }
    }

    /// Drop a table, its rows, and its token history.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.store.drop_table(name)?;
        self.registry.unregister_table(name)
    }

    /// Atomically append rows to a table and commit a new data token.
    ///
    /// The returned token pins the post-append state: queries resolving
    /// it observe exactly these rows regardless of later loads.
    pub fn load(&self, table: &str, rows: Vec<serde_json::Value>) -> Result<DataToken> {
        let loaded = rows.len();
        let _guard = self.load_lock.lock();
        let watermark = self.store.append(table, rows)?;
        let token = self.registry.commit(table, watermark)?;

        info!(
            table = %table,
            rows = loaded,
            data_token = %token.token_id,
            "Rows loaded"
        );
        Ok(token)
    }

    /// The latest committed token for a table.
    pub fn current_token(&self, table: &str) -> Result<DataToken> {
        self.registry.current(table)
    }

    /// Submit a query and stream its responses.
    ///
    /// Every request produces exactly one well-formed stream: request
    /// errors (unknown table, unresolvable token) arrive as the stream's
    /// single FAILED response. Dropping the receiver cancels the request.
    pub fn create_query(&self, request: QueryRequest) -> mpsc::Receiver<QueryResponse> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let driver = QueryDriver::new(
            self.store.clone(),
            self.registry.clone(),
            self.objects.clone(),
            self.config.clone(),
            tx,
        );
        tokio::spawn(driver.run(request));
        rx
    }

    /// Fetch a materialized batch artifact as raw bytes.
    pub fn fetch_artifact(&self, path: &str) -> Result<Bytes> {
        self.objects.get(path)
    }

    /// Fetch a materialized batch and parse its JSON-lines rows.
    pub fn download_batch(&self, path: &str) -> Result<Vec<serde_json::Value>> {
        let body = self.objects.get(path)?;
        let text = std::str::from_utf8(&body)
            .map_err(|e| crate::error::EventideError::Data(format!("invalid artifact: {e}")))?;
        text.lines()
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Field, TableSchema};
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
    fn test_create_table_returns_genesis() {
        let engine = Eventide::in_memory().unwrap();
        let genesis = engine.create_table(events_config()).unwrap();
        assert_eq!(genesis.sequence, 0);
        assert_eq!(engine.current_token("events").unwrap(), genesis);
    }

    #[test]
    fn test_load_advances_current_token() {
        let engine = Eventide::in_memory().unwrap();
        engine.create_table(events_config()).unwrap();

        let t1 = engine
            .load("events", vec![json!({"ts": 1, "user": "a", "value": 1})])
            .unwrap();
        assert_eq!(t1.sequence, 1);
        assert_eq!(t1.row_watermark, 1);
        assert_eq!(engine.current_token("events").unwrap(), t1);

        let t2 = engine
            .load("events", vec![json!({"ts": 2, "user": "b", "value": 2})])
            .unwrap();
        assert_eq!(t2.sequence, 2);
        assert_eq!(t2.row_watermark, 2);
    }

    #[test]
    fn test_drop_table_forgets_tokens() {
        let engine = Eventide::in_memory().unwrap();
        engine.create_table(events_config()).unwrap();
        engine.drop_table("events").unwrap();
        assert!(engine.current_token("events").is_err());
        // Name is reusable afterwards.
        engine.create_table(events_config()).unwrap();
    }
}
