// # File State Store
//
// JSON file implementation of StateStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: write to `<path>.tmp`, then rename over `<path>`
// - Backup: the previous file is copied to `<path>.backup` before each write
// - Recovery: a main file that fails to parse is replaced by the backup
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "resources": {
//     "njalla_record_mx.mail": {
//       "resource_type": "njalla_record_mx",
//       "data": {
//         "id": "42",
//         "fields": { "content": "mail.example.com", "domain": "example.com", ... }
//       },
//       "last_synced": "2026-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateEntry, StateStore};

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

/// File-based state store
///
/// Every mutation is written through immediately; `flush()` only writes
/// when something is pending.
///
/// # Example
///
/// ```rust,no_run
/// use njalla_core::state::FileStateStore;
/// use njalla_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("njalla-state.json").await?;
///     for address in store.list().await? {
///         println!("{address}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    resources: BTreeMap<String, StateEntry>,
    dirty: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    resources: BTreeMap<String, StateEntry>,
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// Creates missing parent directories. A corrupted file is recovered
    /// from its backup; if the backup is unusable too, the store starts
    /// empty.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create state directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let resources = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                resources,
                dirty: false,
            })),
        })
    }

    /// Path of the main state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<BTreeMap<String, StateEntry>, Error> {
        let err = match Self::load(path).await {
            Ok(resources) => {
                tracing::debug!(
                    "Tracking {} resource(s) from {}",
                    resources.len(),
                    path.display()
                );
                return Ok(resources);
            }
            Err(Error::Json(err)) => err,
            Err(other) => return Err(other),
        };

        tracing::warn!("Unreadable state file {}: {}", path.display(), err);
        Ok(Self::recover(path).await)
    }

    /// Restore the main file from `<path>.backup`, or give up with nothing tracked
    async fn recover(path: &Path) -> BTreeMap<String, StateEntry> {
        let backup = Self::backup_path(path);
        if !backup.exists() {
            tracing::warn!("No state backup at {}; tracking nothing", backup.display());
            return BTreeMap::new();
        }

        let resources = match Self::load(&backup).await {
            Ok(resources) => resources,
            Err(err) => {
                tracing::error!("State backup {} unreadable too: {}", backup.display(), err);
                return BTreeMap::new();
            }
        };

        tracing::info!("Restored {} resource(s) from {}", resources.len(), backup.display());
        if let Err(err) = fs::copy(&backup, path).await {
            tracing::error!("Could not put backup back at {}: {}", path.display(), err);
        }
        resources
    }

    async fn load(path: &Path) -> Result<BTreeMap<String, StateEntry>, Error> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let raw = fs::read(path).await.map_err(|e| {
            Error::state_store(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let file: StateFileFormat = serde_json::from_slice(&raw)?;

        if file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "{} has format version {}, this build writes {}",
                path.display(),
                file.version,
                STATE_FILE_VERSION
            );
        }

        Ok(file.resources)
    }

    /// Serialize everything tracked and swap it in with a rename
    async fn write(&self) -> Result<(), Error> {
        let mut guard = self.state.write().await;

        let bytes = serde_json::to_vec_pretty(&StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            resources: guard.resources.clone(),
        })?;

        let staging = self.staging_path();
        let mut file = fs::File::create(&staging).await.map_err(|e| {
            Error::state_store(format!("Cannot create {}: {}", staging.display(), e))
        })?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        if self.path.exists() {
            let backup = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup).await {
                tracing::warn!("Skipping state backup {}: {}", backup.display(), e);
            }
        }

        fs::rename(&staging, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Cannot move {} over {}: {}",
                staging.display(),
                self.path.display(),
                e
            ))
        })?;

        guard.dirty = false;
        tracing::trace!("Wrote {} resource(s) to {}", guard.resources.len(), self.path.display());
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        Self::sibling(&self.path, ".tmp")
    }

    fn backup_path(path: &Path) -> PathBuf {
        Self::sibling(path, ".backup")
    }

    /// `<path><suffix>`, keeping any extension `path` already has
    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, address: &str) -> Result<Option<StateEntry>, Error> {
        Ok(self.state.read().await.resources.get(address).cloned())
    }

    async fn put(&self, address: &str, entry: StateEntry) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            state.resources.insert(address.to_string(), entry);
            state.dirty = true;
        }
        self.write().await
    }

    async fn remove(&self, address: &str) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            if state.resources.remove(address).is_none() {
                return Ok(());
            }
            state.dirty = true;
        }
        self.write().await
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        Ok(self.state.read().await.resources.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        if self.state.read().await.dirty {
            self.write().await
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ResourceData;
    use tempfile::tempdir;

    fn entry(content: &str) -> StateEntry {
        let mut data = ResourceData::new()
            .with("domain", "example.com")
            .with("content", content);
        data.set_id("42");
        StateEntry::new("njalla_record_mx", data)
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        store.put("njalla_record_mx.mail", entry("mx1.example.com")).await.unwrap();
        assert!(path.exists());

        let reloaded = FileStateStore::new(&path).await.unwrap();
        let got = reloaded.get("njalla_record_mx.mail").await.unwrap().unwrap();
        assert_eq!(got.data.id(), Some("42"));
        assert_eq!(got.data.get_str("content").unwrap(), "mx1.example.com");
    }

    #[tokio::test]
    async fn test_file_store_recovers_from_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put("njalla_record_mx.mail", entry("mx1.example.com")).await.unwrap();
        // Second write leaves the first one in the backup
        store.put("njalla_record_mx.mail", entry("mx2.example.com")).await.unwrap();
        assert!(FileStateStore::backup_path(&path).exists());

        fs::write(&path, b"{ not json").await.unwrap();

        let recovered = FileStateStore::new(&path).await.unwrap();
        let got = recovered.get("njalla_record_mx.mail").await.unwrap().unwrap();
        assert_eq!(got.data.get_str("content").unwrap(), "mx1.example.com");
    }

    #[tokio::test]
    async fn test_file_store_corrupted_without_backup_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"garbage").await.unwrap();

        let store = FileStateStore::new(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_sibling_paths_append_suffix() {
        let path = Path::new("/var/lib/njalla/state.backup");
        assert_eq!(
            FileStateStore::backup_path(path),
            PathBuf::from("/var/lib/njalla/state.backup.backup")
        );
        assert_eq!(
            FileStateStore::sibling(Path::new("state.json"), ".tmp"),
            PathBuf::from("state.json.tmp")
        );
    }

    #[tokio::test]
    async fn test_file_store_extension_does_not_collide_with_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.backup");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put("njalla_record_mx.mail", entry("mx1.example.com")).await.unwrap();
        store.put("njalla_record_mx.mail", entry("mx2.example.com")).await.unwrap();

        let reloaded = FileStateStore::new(&path).await.unwrap();
        let got = reloaded.get("njalla_record_mx.mail").await.unwrap().unwrap();
        assert_eq!(got.data.get_str("content").unwrap(), "mx2.example.com");
        assert!(dir.path().join("state.backup.backup").exists());
    }

    #[tokio::test]
    async fn test_file_store_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.put("njalla_record_mx.mail", entry("mx.example.com")).await.unwrap();
        store.remove("njalla_record_mx.mail").await.unwrap();
        store.flush().await.unwrap();

        let reloaded = FileStateStore::new(&path).await.unwrap();
        assert!(reloaded.get("njalla_record_mx.mail").await.unwrap().is_none());
    }
}
