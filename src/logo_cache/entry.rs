//! Listing view of a cached logo

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use super::key::StoredKey;

/// One cached logo as found on disk
#[derive(Debug, Clone, Serialize)]
pub struct LogoCacheEntry {
    /// Normalized company key, or its leading part for over-long keys
    pub company_key: String,
    /// Set when the file name only preserves a prefix of the key
    pub key_truncated: bool,
    pub path: PathBuf,
    pub file_size: u64,
    /// Last time the file was written
    pub cached_at: Option<DateTime<Utc>>,
}

impl LogoCacheEntry {
    pub fn new(key: StoredKey, path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        let (company_key, key_truncated) = match key {
            StoredKey::Exact(key) => (key.as_str().to_string(), false),
            StoredKey::Hashed { prefix } => (prefix, true),
        };
        Self {
            company_key,
            key_truncated,
            path,
            file_size: metadata.len(),
            cached_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}
