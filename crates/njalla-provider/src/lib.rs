// # njalla-provider
//
// Resource handlers for Njalla DNS records.
//
// Each handler implements `njalla_core::Resource` and talks to the
// registrar only through the `RecordApi` handle it is given, so the same
// handler runs against the real JSON-RPC client or an in-memory fake.
//
// ## Resources
//
// - `njalla_record_mx`: [`resources::RecordMx`]

pub mod resources;

use std::sync::Arc;

pub use resources::RecordMx;

/// Register every resource handler of this crate
///
/// # Example
///
/// ```rust
/// use njalla_core::ResourceRegistry;
///
/// let registry = ResourceRegistry::new();
/// njalla_provider::register(&registry);
/// assert!(registry.has("njalla_record_mx"));
/// ```
pub fn register(registry: &njalla_core::ResourceRegistry) {
    registry.register(Arc::new(RecordMx::new()));
}
