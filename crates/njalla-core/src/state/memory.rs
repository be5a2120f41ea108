// # Memory State Store
//
// In-memory implementation of StateStore.
//
// Nothing survives a restart. Useful for tests and one-shot runs where
// resources are re-imported or re-read anyway.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateEntry, StateStore};

/// In-memory state store
///
/// Entries live in a HashMap behind a tokio RwLock; clones share the map.
///
/// # Example
///
/// ```rust,no_run
/// use njalla_core::schema::ResourceData;
/// use njalla_core::state::MemoryStateStore;
/// use njalla_core::traits::{StateEntry, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///
///     let entry = StateEntry::new("njalla_record_mx", ResourceData::new());
///     store.put("njalla_record_mx.mail", entry).await?;
///
///     assert!(store.get("njalla_record_mx.mail").await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, StateEntry>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, address: &str) -> Result<Option<StateEntry>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(address).cloned())
    }

    async fn put(&self, address: &str, entry: StateEntry) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(address.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, address: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(address);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        let mut addresses: Vec<String> = guard.keys().cloned().collect();
        addresses.sort();
        Ok(addresses)
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
