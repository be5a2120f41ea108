// # State Store Trait
//
// Local bookkeeping of managed resource instances.
//
// ## Purpose
//
// The state store remembers, per resource address, the identity and last
// reconciled field values of a resource. It is a cache: every read
// overwrites it from the remote API.
//
// ## Implementations
//
// - In-memory: `MemoryStateStore`
// - JSON file: `FileStateStore`
//
// ## Usage
//
// ```rust,ignore
// use njalla_core::{StateEntry, StateStore};
//
// async fn remember(store: &dyn StateStore, entry: StateEntry) -> njalla_core::Result<()> {
//     store.put("njalla_record_mx.mail", entry).await?;
//     store.flush().await
// }
// ```

use async_trait::async_trait;

use crate::schema::ResourceData;

/// State of one resource instance
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateEntry {
    /// Resource type name, e.g. `njalla_record_mx`
    pub resource_type: String,
    /// Identity and last reconciled fields
    pub data: ResourceData,
    /// When the entry was last reconciled with the remote API
    pub last_synced: chrono::DateTime<chrono::Utc>,
}

impl StateEntry {
    /// Create an entry stamped with the current time
    pub fn new(resource_type: impl Into<String>, data: ResourceData) -> Self {
        Self {
            resource_type: resource_type.into(),
            data,
            last_synced: chrono::Utc::now(),
        }
    }
}

/// Trait for state store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Stores never talk to the remote API.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the entry stored at `address`
    async fn get(&self, address: &str) -> Result<Option<StateEntry>, crate::Error>;

    /// Create or replace the entry at `address`
    async fn put(&self, address: &str, entry: StateEntry) -> Result<(), crate::Error>;

    /// Remove the entry at `address` (no-op when absent)
    async fn remove(&self, address: &str) -> Result<(), crate::Error>;

    /// List stored addresses in sorted order
    async fn list(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
