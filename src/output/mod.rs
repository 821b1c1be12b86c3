//! Output storage for materialized batches
//!
//! The engine's only requirement of output storage is `put` returning a
//! dereferenceable location, `get` for reading it back, and optional
//! presigning with a bounded validity window. Two implementations ship:
//! an in-memory store (default) and a filesystem store. Remote object
//! stores plug in behind the same trait.

use crate::error::{EventideError, Result};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Durable storage for batch artifacts
pub trait ObjectStore: Send + Sync {
    /// Store an artifact under a key and return its URI.
    fn put(&self, key: &str, data: Bytes) -> Result<String>;

    /// Fetch an artifact by URI (plain or presigned).
    fn get(&self, uri: &str) -> Result<Bytes>;

    /// Produce a presigned URL for an existing artifact, valid for
    /// `validity_secs` from now.
    fn presign(&self, uri: &str, validity_secs: u64) -> Result<String>;
}

/// Split a URI into its path part and optional query string.
fn split_query(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    }
}

/// Reject presigned URIs whose validity window has passed.
fn check_expiry(uri: &str, query: Option<&str>) -> Result<()> {
    let Some(query) = query else { return Ok(()) };
    for pair in query.split('&') {
        if let Some(raw) = pair.strip_prefix("expires=") {
            let expires: i64 = raw
                .parse()
                .map_err(|_| EventideError::Request(format!("malformed presigned URL: {uri}")))?;
            if chrono::Utc::now().timestamp() > expires {
                return Err(EventideError::ExpiredUrl(uri.to_string()));
            }
        }
    }
    Ok(())
}

fn presigned(uri: &str, validity_secs: u64) -> String {
    let expires = chrono::Utc::now().timestamp() + validity_secs as i64;
    format!("{uri}?expires={expires}")
}

/// In-memory object store
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    const SCHEME: &'static str = "memory://eventide/";

    /// Create an empty store
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, data: Bytes) -> Result<String> {
        let uri = format!("{}{key}", Self::SCHEME);
        self.objects.write().insert(key.to_string(), data);
        debug!(uri = %uri, "Artifact stored");
        Ok(uri)
    }

    fn get(&self, uri: &str) -> Result<Bytes> {
        let (path, query) = split_query(uri);
        check_expiry(uri, query)?;

        let key = path
            .strip_prefix(Self::SCHEME)
            .ok_or_else(|| EventideError::ObjectNotFound(uri.to_string()))?;
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| EventideError::ObjectNotFound(uri.to_string()))
    }

    fn presign(&self, uri: &str, validity_secs: u64) -> Result<String> {
        let (path, _) = split_query(uri);
        let key = path
            .strip_prefix(Self::SCHEME)
            .ok_or_else(|| EventideError::ObjectNotFound(uri.to_string()))?;
        if !self.objects.read().contains_key(key) {
            return Err(EventideError::ObjectNotFound(uri.to_string()));
        }
        Ok(presigned(path, validity_secs))
    }
}

/// Filesystem-backed object store
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at a directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, uri: &str) -> Result<PathBuf> {
        let (path, _) = split_query(uri);
        let path = path
            .strip_prefix("file://")
            .ok_or_else(|| EventideError::ObjectNotFound(uri.to_string()))?;
        Ok(PathBuf::from(path))
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, data: Bytes) -> Result<String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &data)?;

        let uri = format!("file://{}", path.display());
        debug!(uri = %uri, bytes = data.len(), "Artifact stored");
        Ok(uri)
    }

    fn get(&self, uri: &str) -> Result<Bytes> {
        let (_, query) = split_query(uri);
        check_expiry(uri, query)?;

        let path = self.path_for(uri)?;
        let data = std::fs::read(&path)
            .map_err(|_| EventideError::ObjectNotFound(uri.to_string()))?;
        Ok(Bytes::from(data))
    }

    fn presign(&self, uri: &str, validity_secs: u64) -> Result<String> {
        let path = self.path_for(uri)?;
        if !path.exists() {
            return Err(EventideError::ObjectNotFound(uri.to_string()));
        }
        let (plain, _) = split_query(uri);
        Ok(presigned(plain, validity_secs))
    }
}
