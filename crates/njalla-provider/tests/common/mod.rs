//! Test doubles shared by the resource contract tests
//!
//! `FakeNjalla` is an in-memory registrar: it assigns IDs, keeps records
//! per domain, counts calls per method and can be told to fail.

#![allow(dead_code)]

use njalla_core::error::Result;
use njalla_core::{Error, Record, RecordApi, RecordData, RecordId, ResourceData};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Counters for each API method
#[derive(Debug, Default)]
pub struct CallCounts {
    pub add: AtomicUsize,
    pub list: AtomicUsize,
    pub edit: AtomicUsize,
    pub remove: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.add.load(Ordering::SeqCst)
            + self.list.load(Ordering::SeqCst)
            + self.edit.load(Ordering::SeqCst)
            + self.remove.load(Ordering::SeqCst)
    }
}

/// In-memory registrar
pub struct FakeNjalla {
    domains: Mutex<HashMap<String, Vec<Record>>>,
    next_id: Mutex<RecordId>,
    fail_with: Mutex<Option<String>>,
    lowercase_content: bool,
    edits: Mutex<Vec<Record>>,
    pub calls: Arc<CallCounts>,
}

impl FakeNjalla {
    /// Registrar whose first assigned ID is `first_id`
    pub fn new(first_id: RecordId) -> Self {
        Self {
            domains: Mutex::new(HashMap::new()),
            next_id: Mutex::new(first_id),
            fail_with: Mutex::new(None),
            lowercase_content: false,
            edits: Mutex::new(Vec::new()),
            calls: Arc::new(CallCounts::default()),
        }
    }

    /// Registrar that normalizes content to lowercase, like a server might
    pub fn normalizing(first_id: RecordId) -> Self {
        Self {
            lowercase_content: true,
            ..Self::new(first_id)
        }
    }

    /// Make every following call fail with `message`
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    /// Stop failing
    pub fn recover(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    /// Put a record straight into the server, bypassing the API
    pub fn seed(&self, domain: &str, record: Record) {
        self.domains
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_default()
            .push(record);
    }

    /// Drop a record behind the resource's back
    pub fn vanish(&self, domain: &str, id: RecordId) {
        if let Some(records) = self.domains.lock().unwrap().get_mut(domain) {
            records.retain(|r| !r.has_id(id));
        }
    }

    /// Current server copy of a record
    pub fn record(&self, domain: &str, id: RecordId) -> Option<Record> {
        self.domains
            .lock()
            .unwrap()
            .get(domain)
            .and_then(|records| records.iter().find(|r| r.has_id(id)).cloned())
    }

    /// Records received by edit_record, in order
    pub fn edits(&self) -> Vec<Record> {
        self.edits.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        match self.fail_with.lock().unwrap().as_ref() {
            Some(message) => Err(Error::provider("njalla", message.clone())),
            None => Ok(()),
        }
    }

    fn normalize(&self, mut record: Record) -> Record {
        if self.lowercase_content {
            if let RecordData::Mx { content, .. } = &mut record.data {
                *content = content.to_lowercase();
            }
        }
        record
    }
}

#[async_trait::async_trait]
impl RecordApi for FakeNjalla {
    async fn add_record(&self, domain: &str, record: &Record) -> Result<Record> {
        self.calls.add.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let id = {
            let mut next = self.next_id.lock().unwrap();
            let id = *next;
            *next += 1;
            id
        };
        let saved = self.normalize(record.clone().with_id(id));
        self.seed(domain, saved.clone());
        Ok(saved)
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<Record>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        Ok(self
            .domains
            .lock()
            .unwrap()
            .get(domain)
            .cloned()
            .unwrap_or_default())
    }

    async fn edit_record(&self, domain: &str, record: &Record) -> Result<()> {
        self.calls.edit.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.edits.lock().unwrap().push(record.clone());

        let id = record
            .id
            .ok_or_else(|| Error::invalid_input("edit without id"))?;
        let normalized = self.normalize(record.clone());
        let mut domains = self.domains.lock().unwrap();
        let slot = domains
            .get_mut(domain)
            .and_then(|records| records.iter_mut().find(|r| r.has_id(id)))
            .ok_or_else(|| Error::provider("njalla", "Record not found"))?;
        *slot = normalized;
        Ok(())
    }

    async fn remove_record(&self, domain: &str, id: RecordId) -> Result<()> {
        self.calls.remove.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut domains = self.domains.lock().unwrap();
        let records = domains
            .get_mut(domain)
            .ok_or_else(|| Error::provider("njalla", "Domain not found"))?;
        let before = records.len();
        records.retain(|r| !r.has_id(id));
        if records.len() == before {
            return Err(Error::provider("njalla", "Record not found"));
        }
        Ok(())
    }

    fn api_name(&self) -> &'static str {
        "fake-njalla"
    }
}

/// Configuration of the reference MX record used across tests
pub fn mx_config() -> ResourceData {
    ResourceData::new()
        .with("domain", "example.com")
        .with("name", "@")
        .with("ttl", 3600i64)
        .with("priority", 10i64)
        .with("content", "mail.example.com")
}
