//! DNS record model
//!
//! Records carry a tagged [`RecordData`] per record type, so an MX record
//! always has a priority and an A record never has one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// TTL values accepted by the Njalla API (seconds)
pub const VALID_TTL: &[i64] = &[60, 300, 900, 3600, 10800, 21600, 86400];

/// MX/SRV priority values accepted by the Njalla API
pub const VALID_PRIORITY: &[i64] = &[0, 1, 5, 10, 20];

/// Record identifier assigned by the remote API (scoped per domain)
pub type RecordId = i64;

/// A DNS record as stored at the registrar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Server-assigned identifier, `None` until the record is added
    pub id: Option<RecordId>,
    /// Subdomain label, `"@"` for the zone apex
    pub name: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Type-specific payload
    pub data: RecordData,
}

/// Type-specific record payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecordData {
    /// IPv4 address record
    A {
        /// Address
        content: String,
    },
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa {
        /// Address
        content: String,
    },
    /// Canonical name
    #[serde(rename = "CNAME")]
    Cname {
        /// Target name
        content: String,
    },
    /// Mail exchanger
    #[serde(rename = "MX")]
    Mx {
        /// Preference, lower is preferred
        priority: u32,
        /// Mail server hostname
        content: String,
    },
    /// Text record
    #[serde(rename = "TXT")]
    Txt {
        /// Text content
        content: String,
    },
    /// Name server delegation
    #[serde(rename = "NS")]
    Ns {
        /// Name server hostname
        content: String,
    },
    /// Any record type not modelled above, kept as-is
    Other {
        /// Wire type string
        kind: String,
        /// Raw content
        content: String,
    },
}

impl RecordData {
    /// The wire type string for this payload
    pub fn kind(&self) -> &str {
        match self {
            RecordData::A { .. } => "A",
            RecordData::Aaaa { .. } => "AAAA",
            RecordData::Cname { .. } => "CNAME",
            RecordData::Mx { .. } => "MX",
            RecordData::Txt { .. } => "TXT",
            RecordData::Ns { .. } => "NS",
            RecordData::Other { kind, .. } => kind,
        }
    }

    /// The content string, common to every variant
    pub fn content(&self) -> &str {
        match self {
            RecordData::A { content }
            | RecordData::Aaaa { content }
            | RecordData::Cname { content }
            | RecordData::Mx { content, .. }
            | RecordData::Txt { content }
            | RecordData::Ns { content }
            | RecordData::Other { content, .. } => content,
        }
    }
}

impl Record {
    /// Build a new (not yet added) MX record
    pub fn mx(name: impl Into<String>, ttl: u32, priority: u32, content: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            ttl,
            data: RecordData::Mx {
                priority,
                content: content.into(),
            },
        }
    }

    /// Set the identifier
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// The wire type string
    pub fn kind(&self) -> &str {
        self.data.kind()
    }

    /// Whether this record's identifier equals `id`
    pub fn has_id(&self, id: RecordId) -> bool {
        self.id == Some(id)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        match &self.data {
            RecordData::Mx { priority, content } => write!(
                f,
                "{id} {} {} MX {priority} {content}",
                self.name, self.ttl
            ),
            data => write!(
                f,
                "{id} {} {} {} {}",
                self.name,
                self.ttl,
                data.kind(),
                data.content()
            ),
        }
    }
}
