//! In-process snapshot store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheEntry, SnapshotStore, StoreError};
use crate::data::WeatherSnapshot;

/// Snapshot store backed by a map; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of regions currently held
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, snapshot: &WeatherSnapshot) -> Result<(), StoreError> {
        let entry = CacheEntry::stamp(snapshot.clone());
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }
}
