//! File-backed snapshot store
//!
//! Stores one JSON document per region key in a collection directory. Each
//! write lands in a temporary file first and is then renamed over the
//! document, so readers see either the old or the new entry, never a partial
//! one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::fs;

use super::{CacheEntry, SnapshotStore, StoreError};
use crate::data::WeatherSnapshot;

/// Directory holding the weather documents
const COLLECTION_NAME: &str = "weather_cache";

/// Distinguishes temp files of concurrent writes to the same key
static WRITE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Snapshot store persisting documents to disk
///
/// Documents live in `<data_dir>/weather_cache/<KEY>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where documents are stored
    collection_dir: PathBuf,
}

impl FileStore {
    /// Creates a store in the platform data directory
    ///
    /// Uses `~/.local/share/climapyg/` on Linux, or the equivalent elsewhere.
    /// Returns `None` if no home directory can be determined.
    pub fn default_location() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "climapyg")?;
        Some(Self::new(project_dirs.data_dir()))
    }

    /// Creates a store rooted at `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            collection_dir: data_dir.as_ref().join(COLLECTION_NAME),
        }
    }

    /// Directory holding the documents
    pub fn collection_dir(&self) -> &Path {
        &self.collection_dir
    }

    /// Returns the path to the document for the given key
    fn document_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.collection_dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let path = self.document_path(key)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn write(&self, key: &str, snapshot: &WeatherSnapshot) -> Result<(), StoreError> {
        let path = self.document_path(key)?;
        fs::create_dir_all(&self.collection_dir).await?;

        let entry = CacheEntry::stamp(snapshot.clone());
        let json = serde_json::to_string_pretty(&entry)?;

        let sequence = WRITE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let temp_path = self
            .collection_dir
            .join(format!(".{}.{}.{}.tmp", key, std::process::id(), sequence));

        replace_via_temp(&temp_path, &path, json.as_bytes()).await?;

        tracing::debug!(key, path = %path.display(), "Weather document written");
        Ok(())
    }
}

/// Writes `contents` to `temp_path` and renames it over `path`
///
/// The temp file is removed if either step fails.
async fn replace_via_temp(temp_path: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let result = match fs::write(temp_path, contents).await {
        Ok(()) => fs::rename(temp_path, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = fs::remove_file(temp_path).await;
    }
    result
}
