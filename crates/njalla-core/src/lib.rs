// # njalla-core
//
// Core library for managing Njalla DNS records as declarative resources.
//
// ## Architecture Overview
//
// - **Record**: DNS record model with a tagged payload per record type
// - **RecordApi**: Trait for the registrar's record operations
// - **Resource**: Trait for lifecycle callbacks (create/read/update/delete/import)
// - **Schema / ResourceData**: Field declarations and per-instance storage
// - **Provider**: Driver that validates, plans and dispatches lifecycle calls
// - **ResourceRegistry**: Name-based registry of resource types
// - **StateStore**: Local bookkeeping of managed instances
//
// ## Design Principles
//
// 1. **Remote is authoritative**: every mutation is followed by a read
// 2. **Explicit handles**: the API client is passed into each callback
// 3. **Validate first**: schema checks run before any API call
// 4. **No hidden retries**: API errors are wrapped and returned

pub mod config;
pub mod error;
pub mod import;
pub mod provider;
pub mod record;
pub mod registry;
pub mod schema;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{MxRecordConfig, ProviderConfig};
pub use error::{Error, Result};
pub use provider::{Plan, Provider};
pub use record::{Record, RecordData, RecordId, VALID_PRIORITY, VALID_TTL};
pub use registry::ResourceRegistry;
pub use schema::{FieldKind, FieldSchema, ResourceData, Schema, Validation, Value};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{RecordApi, Resource, StateEntry, StateStore};
