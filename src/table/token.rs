//! Data tokens and the token registry
//!
//! A data token is an immutable identifier for a snapshot of a table's
//! contents at a point in append history. Tokens are strictly ordered per
//! table, never mutated, and never destroyed: resolving the same token
//! always yields the same row set regardless of later commits.
//!
//! Every table gets a genesis token (sequence 0, empty snapshot) when it
//! is registered, so `current` is total for known tables: a query against
//! a never-loaded table completes with zero-count metrics instead of
//! failing, which keeps "empty snapshot" distinguishable from "failed".

use crate::error::{EventideError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// An immutable snapshot identifier for a table's data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataToken {
    /// Globally unique token id
    pub token_id: String,
    /// Owning table
    pub table: String,
    /// Strict per-table ordering (genesis is 0)
    pub sequence: u64,
    /// Rows visible under this token
    pub row_watermark: u64,
    /// When the token was minted
    pub created_at: DateTime<Utc>,
}

/// Per-table token history, oldest first
struct TableTokens {
    history: Vec<DataToken>,
}

impl TableTokens {
    fn current(&self) -> &DataToken {
        // history always holds at least the genesis token
        &self.history[self.history.len() - 1]
    }
}

/// Registry of committed data tokens
///
/// The sole shared resource across concurrent requests. Commits take the
/// write lock, so a token is either fully visible to `current`/`resolve`
/// or not visible at all.
pub struct TokenRegistry {
    tables: RwLock<HashMap<String, TableTokens>>,
}

impl TokenRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    fn mint(table: &str, sequence: u64, row_watermark: u64) -> DataToken {
        DataToken {
            token_id: uuid::Uuid::new_v4().to_string(),
            table: table.to_string(),
            sequence,
            row_watermark,
            created_at: Utc::now(),
        }
    }

    /// Register a table and mint its genesis token.
    pub fn register_table(&self, table: &str) -> Result<DataToken> {
        let mut tables = self.tables.write();
        if tables.contains_key(table) {
            return Err(EventideError::TableAlreadyExists(table.to_string()));
        }

        let genesis = Self::mint(table, 0, 0);
        tables.insert(
            table.to_string(),
            TableTokens {
                history: vec![genesis.clone()],
            },
        );
        Ok(genesis)
    }

    /// Forget a table's token history.
    pub fn unregister_table(&self, table: &str) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.remove(table).is_none() {
            return Err(EventideError::TableNotFound(table.to_string()));
        }
        Ok(())
    }

    /// Commit a new snapshot and return its token.
    ///
    /// Called after the table store has durably appended rows;
    /// `row_watermark` is the post-append row count.
    pub fn commit(&self, table: &str, row_watermark: u64) -> Result<DataToken> {
        let mut tables = self.tables.write();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| EventideError::TableNotFound(table.to_string()))?;

        let token = Self::mint(table, entry.current().sequence + 1, row_watermark);
        entry.history.push(token.clone());

        info!(
            table = %table,
            token_id = %token.token_id,
            sequence = token.sequence,
            row_watermark,
            "Data token committed"
        );
        Ok(token)
    }

    /// Return the latest committed token for a table.
    pub fn current(&self, table: &str) -> Result<DataToken> {
        let tables = self.tables.read();
        let entry = tables
            .get(table)
            .ok_or_else(|| EventideError::TableNotFound(table.to_string()))?;
        Ok(entry.current().clone())
    }

    /// Resolve an optional explicit token id.
    ///
    /// With an id, validates it was issued for this table (tokens are
    /// never invalidated, so any issued id resolves); without one,
    /// returns the current token.
    pub fn resolve(&self, table: &str, token_id: Option<&str>) -> Result<DataToken> {
        let tables = self.tables.read();
        let entry = tables
            .get(table)
            .ok_or_else(|| EventideError::TableNotFound(table.to_string()))?;

        match token_id {
            None => Ok(entry.current().clone()),
            Some(id) => entry
                .history
                .iter()
                .find(|t| t.token_id == id)
                .cloned()
                .ok_or_else(|| EventideError::UnknownToken {
                    table: table.to_string(),
                    token: id.to_string(),
                }),
        }
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_token() {
        let registry = TokenRegistry::new();
        let genesis = registry.register_table("purchases").unwrap();
        assert_eq!(genesis.sequence, 0);
        assert_eq!(genesis.row_watermark, 0);

        let current = registry.current("purchases").unwrap();
        assert_eq!(current, genesis);
    }

    #[test]
    fn test_commit_orders_strictly() {
        let registry = TokenRegistry::new();
        registry.register_table("purchases").unwrap();

        let t1 = registry.commit("purchases", 10).unwrap();
        let t2 = registry.commit("purchases", 15).unwrap();

        assert_eq!(t1.sequence, 1);
        assert_eq!(t2.sequence, 2);
        assert_ne!(t1.token_id, t2.token_id);
        assert_eq!(registry.current("purchases").unwrap(), t2);
    }

    #[test]
    fn test_resolve_explicit_is_stable() {
        let registry = TokenRegistry::new();
        registry.register_table("purchases").unwrap();
        let t1 = registry.commit("purchases", 10).unwrap();
        registry.commit("purchases", 15).unwrap();

        // Earlier tokens stay resolvable with their original watermark
        let resolved = registry.resolve("purchases", Some(&t1.token_id)).unwrap();
        assert_eq!(resolved.row_watermark, 10);
        assert_eq!(resolved, t1);
    }

    #[test]
    fn test_resolve_none_is_current() {
        let registry = TokenRegistry::new();
        registry.register_table("purchases").unwrap();
        let t1 = registry.commit("purchases", 10).unwrap();

        let resolved = registry.resolve("purchases", None).unwrap();
        assert_eq!(resolved, t1);
    }

    #[test]
    fn test_resolve_unknown_token() {
        let registry = TokenRegistry::new();
        registry.register_table("purchases").unwrap();

        let err = registry.resolve("purchases", Some("no-such-token"));
        assert!(matches!(err, Err(EventideError::UnknownToken { .. })));
    }

    #[test]
    fn test_token_belongs_to_its_table() {
        let registry = TokenRegistry::new();
        registry.register_table("a").unwrap();
        registry.register_table("b").unwrap();
        let token = registry.commit("a", 5).unwrap();

        assert!(registry.resolve("b", Some(&token.token_id)).is_err());
    }

    #[test]
    fn test_unknown_table() {
        let registry = TokenRegistry::new();
        assert!(registry.current("nope").is_err());
        assert!(registry.commit("nope", 1).is_err());
        assert!(registry.resolve("nope", None).is_err());
    }
}
