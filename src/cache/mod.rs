//! Weather snapshot store
//!
//! Holds at most one document per region key: the most recent snapshot plus
//! the time it was written. Writes are upserts and stamp `last_updated`
//! themselves; staleness is not evaluated here. Two backends are provided:
//! an in-process map and a directory of JSON documents.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::data::WeatherSnapshot;

/// Errors raised by a snapshot store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid document key: '{0}'")]
    InvalidKey(String),
}

/// Persisted form of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub snapshot: WeatherSnapshot,
    /// When the store wrote this entry; sole input to staleness
    #[serde(deserialize_with = "deserialize_utc_lenient")]
    pub last_updated: DateTime<Utc>,
}

impl CacheEntry {
    /// Wraps a snapshot, stamping it with the current time
    pub(crate) fn stamp(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot,
            last_updated: Utc::now(),
        }
    }
}

/// Key-document store for weather snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Point lookup of the entry for `key`
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Upserts the entry for `key`, setting `last_updated` to now
    async fn write(&self, key: &str, snapshot: &WeatherSnapshot) -> Result<(), StoreError>;
}

/// Parses a timestamp, treating values without an offset as UTC
pub fn parse_utc_lenient(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(zoned) = DateTime::parse_from_rfc3339(value) {
        return Some(zoned.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_utc_lenient<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_utc_lenient(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}
