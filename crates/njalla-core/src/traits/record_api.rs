// # Record API Trait
//
// The contract resources use to talk to the registrar.
//
// ## Implementations
//
// - Njalla JSON-RPC: `njalla-client` crate
// - Tests: in-memory fakes
//
// ## Usage
//
// ```rust,ignore
// use njalla_core::{Record, RecordApi};
//
// async fn add_mx(api: &dyn RecordApi) -> njalla_core::Result<()> {
//     let saved = api
//         .add_record("example.com", &Record::mx("@", 3600, 10, "mail.example.com"))
//         .await?;
//     println!("assigned id {:?}", saved.id);
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::{Record, RecordId};

/// Registrar record operations
///
/// Every method is a single API call. Implementations do not retry,
/// cache, or spawn tasks; failures are returned to the caller as-is.
///
/// The handle is passed by reference into each resource operation, so
/// credentials live in the implementation rather than in ambient state.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Add a record to `domain`, returning it with its assigned ID
    async fn add_record(&self, domain: &str, record: &Record) -> Result<Record, crate::Error>;

    /// List every record of `domain`, of any type
    async fn list_records(&self, domain: &str) -> Result<Vec<Record>, crate::Error>;

    /// Replace the record whose ID is `record.id` with the given values
    ///
    /// All fields are sent; there is no partial update.
    async fn edit_record(&self, domain: &str, record: &Record) -> Result<(), crate::Error>;

    /// Remove record `id` from `domain`
    async fn remove_record(&self, domain: &str, id: RecordId) -> Result<(), crate::Error>;

    /// Name of the backing API (for logging)
    fn api_name(&self) -> &'static str;
}
