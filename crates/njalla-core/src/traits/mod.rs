//! Core traits
//!
//! This module defines the abstract interfaces that implementations follow.
//!
//! - [`RecordApi`]: Registrar record operations
//! - [`Resource`]: Lifecycle callbacks of a managed resource type
//! - [`StateStore`]: Local bookkeeping of resource instances

pub mod record_api;
pub mod resource;
pub mod state_store;

pub use record_api::RecordApi;
pub use resource::Resource;
pub use state_store::{StateEntry, StateStore};
