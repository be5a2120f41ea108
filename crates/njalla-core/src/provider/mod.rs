//! Resource lifecycle driver
//!
//! The [`Provider`] is the host-side half of the resource contract: it
//! applies schema defaults, validates configuration before any API call,
//! dispatches to the registered [`Resource`] callbacks with the API
//! handle, and owns identity bookkeeping that callbacks leave to the
//! host (clearing identity after delete).
//!
//! ## Apply Flow
//!
//! ```text
//! prior state ──┐
//!               ├──► plan() ──► Create | Update | Replace | NoOp
//! desired ──────┘                  │
//!                                  ▼
//!                   Resource callbacks (via RecordApi)
//! ```
//!
//! Replace is chosen when a force-new field (such as `domain`) differs;
//! it deletes the old object before creating the new one.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::registry::ResourceRegistry;
use crate::schema::ResourceData;
use crate::traits::{RecordApi, Resource};

/// Planned action for one resource instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// No remote object yet
    Create,
    /// Object exists; these fields change in place
    Update {
        /// Changed field names
        changed: Vec<&'static str>,
    },
    /// Object exists; these force-new fields require recreation
    Replace {
        /// Force-new field names that differ
        reasons: Vec<&'static str>,
    },
    /// Desired and prior values are identical
    NoOp,
}

/// Lifecycle driver for registered resource types
pub struct Provider {
    registry: Arc<ResourceRegistry>,
    api: Arc<dyn RecordApi>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("registry", &self.registry)
            .field("api", &self.api.api_name())
            .finish()
    }
}

impl Provider {
    /// Create a driver over a registry and an API handle
    pub fn new(registry: Arc<ResourceRegistry>, api: Arc<dyn RecordApi>) -> Self {
        Self { registry, api }
    }

    /// The API handle passed into every callback
    pub fn api(&self) -> &dyn RecordApi {
        self.api.as_ref()
    }

    fn prepare(resource: &dyn Resource, data: &mut ResourceData) -> Result<()> {
        let schema = resource.schema();
        schema.apply_defaults(data);
        schema.validate(data).map_err(|e| {
            debug!("Rejected {} configuration: {}", resource.type_name(), e);
            e
        })
    }

    fn require_id(type_name: &str, data: &ResourceData) -> Result<()> {
        if data.has_id() {
            Ok(())
        } else {
            Err(Error::invalid_input(format!(
                "{type_name} instance has no identity; it does not exist remotely"
            )))
        }
    }

    /// Create a new remote object
    pub async fn create(&self, type_name: &str, mut data: ResourceData) -> Result<ResourceData> {
        let resource = self.registry.get(type_name)?;
        if data.has_id() {
            return Err(Error::invalid_input(format!(
                "{type_name} instance already has identity {}",
                data.id().unwrap_or_default()
            )));
        }
        Self::prepare(resource.as_ref(), &mut data)?;

        info!("Creating {}", type_name);
        resource.create(self.api(), &mut data).await?;
        info!("Created {} with id {}", type_name, data.id().unwrap_or("<none>"));
        Ok(data)
    }

    /// Refresh an instance from the remote API
    ///
    /// Instances without identity are returned untouched. When the
    /// remote object is gone the returned data has no identity.
    pub async fn read(&self, type_name: &str, mut data: ResourceData) -> Result<ResourceData> {
        let resource = self.registry.get(type_name)?;
        if !data.has_id() {
            debug!("Skipping read of {} without identity", type_name);
            return Ok(data);
        }

        let id = data.id().unwrap_or_default().to_string();
        resource.read(self.api(), &mut data).await?;
        if !data.has_id() {
            warn!("{} {} no longer exists remotely", type_name, id);
        }
        Ok(data)
    }

    /// Replace the remote object with the values in `data`
    pub async fn update(&self, type_name: &str, mut data: ResourceData) -> Result<ResourceData> {
        let resource = self.registry.get(type_name)?;
        Self::require_id(type_name, &data)?;
        Self::prepare(resource.as_ref(), &mut data)?;

        info!("Updating {} {}", type_name, data.id().unwrap_or_default());
        resource.update(self.api(), &mut data).await?;
        Ok(data)
    }

    /// Delete the remote object and clear the instance's identity
    pub async fn delete(&self, type_name: &str, mut data: ResourceData) -> Result<ResourceData> {
        let resource = self.registry.get(type_name)?;
        Self::require_id(type_name, &data)?;

        info!("Deleting {} {}", type_name, data.id().unwrap_or_default());
        resource.delete(self.api(), &mut data).await?;
        data.clear_id();
        Ok(data)
    }

    /// Adopt existing remote objects by import identifier
    pub async fn import(&self, type_name: &str, import_id: &str) -> Result<Vec<ResourceData>> {
        let resource = self.registry.get(type_name)?;

        info!("Importing {} {}", type_name, import_id);
        let imported = resource.import(self.api(), import_id).await?;
        debug!("Imported {} instance(s) of {}", imported.len(), type_name);
        Ok(imported)
    }

    /// Decide what `apply` would do, without calling the API
    ///
    /// `prior` should be freshly read; an instance without identity is
    /// treated as absent.
    pub fn plan(
        &self,
        type_name: &str,
        prior: Option<&ResourceData>,
        desired: &ResourceData,
    ) -> Result<Plan> {
        let resource = self.registry.get(type_name)?;
        let mut desired = desired.clone();
        Self::prepare(resource.as_ref(), &mut desired)?;

        let Some(prior) = prior.filter(|p| p.has_id()) else {
            return Ok(Plan::Create);
        };

        let schema = resource.schema();
        let reasons = schema.force_new_changes(prior, &desired);
        if !reasons.is_empty() {
            return Ok(Plan::Replace { reasons });
        }

        let changed = schema.changed_fields(prior, &desired);
        if changed.is_empty() {
            Ok(Plan::NoOp)
        } else {
            Ok(Plan::Update { changed })
        }
    }

    /// Converge the remote object towards `desired`
    pub async fn apply(
        &self,
        type_name: &str,
        prior: Option<ResourceData>,
        desired: ResourceData,
    ) -> Result<ResourceData> {
        let plan = self.plan(type_name, prior.as_ref(), &desired)?;
        info!("Plan for {}: {:?}", type_name, plan);

        match (plan, prior) {
            (Plan::Create, _) | (_, None) => self.create(type_name, desired).await,
            (Plan::NoOp, Some(prior)) => Ok(prior),
            (Plan::Update { .. }, Some(prior)) => {
                let mut desired = desired;
                if let Some(id) = prior.id() {
                    desired.set_id(id);
                }
                self.update(type_name, desired).await
            }
            (Plan::Replace { reasons }, Some(prior)) => {
                info!("Replacing {}: {} changed", type_name, reasons.join(", "));
                self.delete(type_name, prior).await?;
                self.create(type_name, desired).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, RecordId};
    use crate::schema::{FieldSchema, Schema};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// API handle that must never be reached by these tests
    struct UnreachableApi;

    #[async_trait]
    impl RecordApi for UnreachableApi {
        async fn add_record(&self, _domain: &str, _record: &Record) -> Result<Record> {
            Err(Error::Other("unexpected add_record".to_string()))
        }

        async fn list_records(&self, _domain: &str) -> Result<Vec<Record>> {
            Err(Error::Other("unexpected list_records".to_string()))
        }

        async fn edit_record(&self, _domain: &str, _record: &Record) -> Result<()> {
            Err(Error::Other("unexpected edit_record".to_string()))
        }

        async fn remove_record(&self, _domain: &str, _id: RecordId) -> Result<()> {
            Err(Error::Other("unexpected remove_record".to_string()))
        }

        fn api_name(&self) -> &'static str {
            "unreachable"
        }
    }

    /// Resource that records which callbacks ran
    struct JournalResource {
        schema: Schema,
        calls: Mutex<Vec<&'static str>>,
    }

    impl JournalResource {
        fn new() -> Self {
            Self {
                schema: Schema::new()
                    .field("zone", FieldSchema::string().force_new())
                    .field("value", FieldSchema::int()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn log(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Resource for JournalResource {
        fn type_name(&self) -> &'static str {
            "journal"
        }

        fn schema(&self) -> &Schema {
            &self.schema
        }

        async fn create(&self, _api: &dyn RecordApi, data: &mut ResourceData) -> Result<()> {
            self.log("create");
            data.set_id("1");
            Ok(())
        }

        async fn read(&self, _api: &dyn RecordApi, _data: &mut ResourceData) -> Result<()> {
            self.log("read");
            Ok(())
        }

        async fn update(&self, _api: &dyn RecordApi, _data: &mut ResourceData) -> Result<()> {
            self.log("update");
            Ok(())
        }

        async fn delete(&self, _api: &dyn RecordApi, _data: &mut ResourceData) -> Result<()> {
            self.log("delete");
            Ok(())
        }

        async fn import(&self, _api: &dyn RecordApi, _import_id: &str) -> Result<Vec<ResourceData>> {
            self.log("import");
            Ok(Vec::new())
        }
    }

    fn provider() -> (Provider, Arc<JournalResource>) {
        let resource = Arc::new(JournalResource::new());
        let registry = Arc::new(ResourceRegistry::new());
        registry.register(resource.clone());
        (Provider::new(registry, Arc::new(UnreachableApi)), resource)
    }

    fn existing(zone: &str, value: i64) -> ResourceData {
        let mut data = ResourceData::new().with("zone", zone).with("value", value);
        data.set_id("1");
        data
    }

    #[test]
    fn test_plan_variants() {
        let (provider, _) = provider();
        let desired = ResourceData::new().with("zone", "a.com").with("value", 1i64);

        assert_eq!(provider.plan("journal", None, &desired).unwrap(), Plan::Create);

        let mut gone = existing("a.com", 1);
        gone.clear_id();
        assert_eq!(provider.plan("journal", Some(&gone), &desired).unwrap(), Plan::Create);

        assert_eq!(
            provider.plan("journal", Some(&existing("a.com", 1)), &desired).unwrap(),
            Plan::NoOp
        );
        assert_eq!(
            provider.plan("journal", Some(&existing("a.com", 2)), &desired).unwrap(),
            Plan::Update { changed: vec!["value"] }
        );
        assert_eq!(
            provider.plan("journal", Some(&existing("b.com", 1)), &desired).unwrap(),
            Plan::Replace { reasons: vec!["zone"] }
        );
    }

    #[tokio::test]
    async fn test_invalid_config_never_reaches_callbacks() {
        let (provider, resource) = provider();
        let desired = ResourceData::new().with("zone", "a.com");

        let err = provider.create("journal", desired).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(resource.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_clears_identity() {
        let (provider, _) = provider();
        let data = provider.delete("journal", existing("a.com", 1)).await.unwrap();
        assert!(!data.has_id());
    }

    #[tokio::test]
    async fn test_update_and_delete_require_identity() {
        let (provider, resource) = provider();
        let data = ResourceData::new().with("zone", "a.com").with("value", 1i64);

        assert!(matches!(
            provider.update("journal", data.clone()).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            provider.delete("journal", data.clone()).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            provider.create("journal", existing("a.com", 1)).await,
            Err(Error::InvalidInput(_))
        ));

        // Reading an absent instance is a no-op
        provider.read("journal", data).await.unwrap();
        assert!(resource.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_replace_deletes_then_creates() {
        let (provider, resource) = provider();
        let desired = ResourceData::new().with("zone", "b.com").with("value", 1i64);

        let data = provider
            .apply("journal", Some(existing("a.com", 1)), desired)
            .await
            .unwrap();

        assert_eq!(data.id(), Some("1"));
        assert_eq!(data.get_str("zone").unwrap(), "b.com");
        assert_eq!(*resource.calls.lock().unwrap(), vec!["delete", "create"]);
    }

    #[tokio::test]
    async fn test_apply_update_carries_prior_identity() {
        let (provider, resource) = provider();
        let desired = ResourceData::new().with("zone", "a.com").with("value", 5i64);

        let data = provider
            .apply("journal", Some(existing("a.com", 1)), desired)
            .await
            .unwrap();

        assert_eq!(data.id(), Some("1"));
        assert_eq!(data.get_int("value").unwrap(), 5);
        assert_eq!(*resource.calls.lock().unwrap(), vec!["update"]);
    }

    #[test]
    fn test_unknown_type() {
        let (provider, _) = provider();
        assert!(matches!(
            provider.plan("nope", None, &ResourceData::new()),
            Err(Error::Config(_))
        ));
    }
}
