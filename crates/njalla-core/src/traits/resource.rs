// # Resource Trait
//
// Lifecycle callbacks of a managed resource type.
//
// The driver (`Provider`) validates configuration against `schema()` and
// then invokes one callback. Callbacks read typed fields from
// `ResourceData`, call the record API, and write the authoritative
// remote values back.
//
// ## Contract
//
// - `create` sets the identity and reconciles from the server.
// - `read` overwrites local fields from the server, or clears the
//   identity when the remote object is gone. Absence is not an error.
// - `update` sends the complete field set, then reconciles.
// - `delete` removes the remote object; the driver clears the identity.
// - `import` builds the full local representation from an import ID.
//   Absence IS an error here: there is nothing to adopt.

use async_trait::async_trait;

use crate::schema::{ResourceData, Schema};
use crate::traits::RecordApi;

/// A managed resource type
#[async_trait]
pub trait Resource: Send + Sync {
    /// Registry name, e.g. `njalla_record_mx`
    fn type_name(&self) -> &'static str;

    /// Field schema used for defaults, validation and replacement planning
    fn schema(&self) -> &Schema;

    /// Create the remote object described by `data`
    async fn create(&self, api: &dyn RecordApi, data: &mut ResourceData) -> Result<(), crate::Error>;

    /// Refresh `data` from the remote object
    async fn read(&self, api: &dyn RecordApi, data: &mut ResourceData) -> Result<(), crate::Error>;

    /// Replace the remote object with the values in `data`
    async fn update(&self, api: &dyn RecordApi, data: &mut ResourceData) -> Result<(), crate::Error>;

    /// Delete the remote object
    async fn delete(&self, api: &dyn RecordApi, data: &mut ResourceData) -> Result<(), crate::Error>;

    /// Adopt an existing remote object
    async fn import(
        &self,
        api: &dyn RecordApi,
        import_id: &str,
    ) -> Result<Vec<ResourceData>, crate::Error>;
}
