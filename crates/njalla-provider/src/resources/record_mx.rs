//! `njalla_record_mx`: MX records at the zone level
//!
//! | Field    | Kind    | Notes                          |
//! |----------|---------|--------------------------------|
//! | domain   | string  | forces replacement when changed |
//! | name     | string  | defaults to `@`                |
//! | ttl      | integer | one of [`VALID_TTL`]           |
//! | priority | integer | one of [`VALID_PRIORITY`]      |
//! | content  | string  | mail exchanger hostname        |
//!
//! The identity is the record ID assigned by Njalla, as a decimal string.
//! Record IDs are scoped per domain, so `domain` + identity name a record.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use njalla_core::import::parse_import_id;
use njalla_core::{
    Error, FieldSchema, Record, RecordApi, RecordData, RecordId, Resource, ResourceData, Result,
    Schema, VALID_PRIORITY, VALID_TTL, Validation,
};

/// Registry name of the MX record resource
pub const TYPE_NAME: &str = "njalla_record_mx";

/// MX record resource handler
#[derive(Debug, Clone)]
pub struct RecordMx {
    schema: Schema,
}

impl RecordMx {
    /// Create the handler with its schema
    pub fn new() -> Self {
        let schema = Schema::new()
            .field("domain", FieldSchema::string().force_new())
            .field("name", FieldSchema::string().default_value("@"))
            .field(
                "ttl",
                FieldSchema::int().validate(Validation::IntInSlice(VALID_TTL)),
            )
            .field(
                "priority",
                FieldSchema::int().validate(Validation::IntInSlice(VALID_PRIORITY)),
            )
            .field("content", FieldSchema::string());

        Self { schema }
    }
}

impl Default for RecordMx {
    fn default() -> Self {
        Self::new()
    }
}

fn to_u32(field: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::invalid_input(format!("{field} {value} is out of range")))
}

fn stored_id(data: &ResourceData) -> Result<RecordId> {
    let id = data
        .id()
        .ok_or_else(|| Error::invalid_input("MX record has no identity"))?;
    id.parse()
        .map_err(|_| Error::invalid_input(format!("MX record identity {id:?} is not numeric")))
}

/// Build the full MX record described by `data`
fn record_from(data: &ResourceData) -> Result<Record> {
    Ok(Record::mx(
        data.get_str("name")?,
        to_u32("ttl", data.get_int("ttl")?)?,
        to_u32("priority", data.get_int("priority")?)?,
        data.get_str("content")?,
    ))
}

/// Copy server values into `data`; false if `record` is not an MX record
fn set_from_record(data: &mut ResourceData, record: &Record) -> bool {
    let RecordData::Mx { priority, content } = &record.data else {
        return false;
    };

    data.set("name", record.name.as_str());
    data.set("ttl", record.ttl);
    data.set("priority", *priority);
    data.set("content", content.as_str());
    true
}

async fn list(api: &dyn RecordApi, domain: &str) -> Result<Vec<Record>> {
    api.list_records(domain)
        .await
        .map_err(|e| Error::api(format!("Reading records for domain {domain} failed"), e))
}

#[async_trait]
impl Resource for RecordMx {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn create(&self, api: &dyn RecordApi, data: &mut ResourceData) -> Result<()> {
        let domain = data.get_str("domain")?.to_string();
        let record = record_from(data)?;

        let saved = api
            .add_record(&domain, &record)
            .await
            .map_err(|e| Error::api("Adding record failed", e))?;

        let id = saved
            .id
            .ok_or_else(|| Error::provider(api.api_name(), "add-record returned no record id"))?;
        data.set_id(id.to_string());
        info!("Added MX record {} to {}", id, domain);

        self.read(api, data).await
    }

    async fn read(&self, api: &dyn RecordApi, data: &mut ResourceData) -> Result<()> {
        let domain = data.get_str("domain")?.to_string();
        let id = stored_id(data)?;

        let records = list(api, &domain).await?;

        let Some(record) = records.iter().find(|r| r.has_id(id)) else {
            debug!("MX record {} not found in {}", id, domain);
            data.clear_id();
            return Ok(());
        };

        if set_from_record(data, record) {
            debug!("Synced MX record {} of {}", id, domain);
        } else {
            warn!(
                "Record {} of {} is now a {} record; treating MX record as gone",
                id,
                domain,
                record.kind()
            );
            data.clear_id();
        }

        Ok(())
    }

    async fn update(&self, api: &dyn RecordApi, data: &mut ResourceData) -> Result<()> {
        let domain = data.get_str("domain")?.to_string();
        let id = stored_id(data)?;
        let record = record_from(data)?.with_id(id);

        api.edit_record(&domain, &record).await.map_err(|e| {
            Error::api(format!("Updating record {id} for domain {domain} failed"), e)
        })?;
        info!("Edited MX record {} of {}", id, domain);

        self.read(api, data).await
    }

    async fn delete(&self, api: &dyn RecordApi, data: &mut ResourceData) -> Result<()> {
        let domain = data.get_str("domain")?.to_string();
        let id = stored_id(data)?;

        api.remove_record(&domain, id).await.map_err(|e| {
            Error::api(format!("Deleting record {id} from domain {domain} failed"), e)
        })?;
        info!("Removed MX record {} from {}", id, domain);

        Ok(())
    }

    async fn import(&self, api: &dyn RecordApi, import_id: &str) -> Result<Vec<ResourceData>> {
        let (domain, id) = parse_import_id(import_id)?;

        let records = list(api, &domain).await?;

        let record = records
            .iter()
            .find(|r| r.has_id(id))
            .ok_or_else(|| {
                Error::not_found(format!("Couldn't find record {id} for domain {domain}"))
            })?;

        let mut data = ResourceData::new().with("domain", domain.as_str());
        if !set_from_record(&mut data, record) {
            return Err(Error::invalid_input(format!(
                "Record {id} for domain {domain} is a {} record, not MX",
                record.kind()
            )));
        }
        data.set_id(id.to_string());

        Ok(vec![data])
    }
}
