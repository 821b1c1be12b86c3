//! Engine configuration
//!
//! Tunables for batch sizing, response channel capacity, materializer
//! retry bounds, and presigned-URL validity. Defaults work out of the box
//! for in-memory usage; `persistent` stores batch artifacts on the local
//! filesystem instead.

use std::path::PathBuf;

/// Configuration for an Eventide engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory for batch artifacts (None = in-memory object store)
    pub data_dir: Option<PathBuf>,
    /// Maximum output rows per materialized batch
    pub batch_size: usize,
    /// Capacity of the per-request response channel
    pub channel_capacity: usize,
    /// Bounded retries for transient object-store write failures
    pub max_write_retries: u32,
    /// Validity window for presigned result URLs, in seconds
    pub presign_validity_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None, // In-memory by default
            batch_size: 8192,
            channel_capacity: 32,
            max_write_retries: 3,
            presign_validity_secs: 3600,
        }
    }
}

impl EngineConfig {
    /// Create config for in-memory artifact storage
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create config for filesystem artifact storage
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Set the maximum output rows per materialized batch
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the response channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Set the retry bound for object-store writes
    pub fn with_write_retries(mut self, retries: u32) -> Self {
        self.max_write_retries = retries;
        self
    }

    /// Set the presigned-URL validity window in seconds
    pub fn with_presign_validity_secs(mut self, secs: u64) -> Self {
        self.presign_validity_secs = secs;
        self
    }
}
