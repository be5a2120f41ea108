//! Resource registry
//!
//! Resource types register themselves by name, so the driver and the
//! command line never hard-code which types exist.
//!
//! ## Registration
//!
//! ```rust,ignore
//! // In the njalla-provider crate
//! pub fn register(registry: &ResourceRegistry) {
//!     registry.register(Arc::new(RecordMx::new()));
//! }
//! ```

use crate::error::{Error, Result};
use crate::traits::Resource;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of resource types keyed by type name
///
/// Uses interior mutability so registration works through a shared
/// reference.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: RwLock<HashMap<&'static str, Arc<dyn Resource>>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type under its `type_name()`
    ///
    /// Registering the same name twice replaces the earlier entry.
    pub fn register(&self, resource: Arc<dyn Resource>) {
        let name = resource.type_name();
        match self.resources.write() {
            Ok(mut resources) => {
                if resources.insert(name, resource).is_some() {
                    tracing::warn!("Resource type {} registered twice, replacing", name);
                }
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(name, resource);
            }
        }
    }

    /// Look up a resource type
    pub fn get(&self, type_name: &str) -> Result<Arc<dyn Resource>> {
        let resources = self
            .resources
            .read()
            .map_err(|_| Error::Other("resource registry lock poisoned".to_string()))?;

        resources
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown resource type: {type_name}")))
    }

    /// Whether a resource type is registered
    pub fn has(&self, type_name: &str) -> bool {
        self.resources
            .read()
            .map(|resources| resources.contains_key(type_name))
            .unwrap_or(false)
    }

    /// Registered type names, sorted
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .resources
            .read()
            .map(|resources| resources.keys().copied().collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.list())
            .finish()
    }
}
