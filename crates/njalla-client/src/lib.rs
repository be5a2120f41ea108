// # Njalla API Client
//
// Thin client for the Njalla JSON-RPC API, implementing `RecordApi`.
//
// ## Behaviour
//
// - One HTTP request per trait call
// - Errors are mapped and returned; no retry, no backoff, no caching
// - HTTP timeout configured (default 30 seconds)
// - Specific errors for HTTP 401/403, 429 and 5xx
// - JSON-RPC error envelopes surface as provider errors
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails if the token is empty
//
// ## API Reference
//
// Every call is `POST <endpoint>` with `Authorization: Njalla <token>` and
// a body of `{"method": "<name>", "params": {...}}`. Responses carry either
// `{"result": ...}` or `{"error": {"code": ..., "message": ...}}`.
//
// - `list-records`  params `{domain}`           → `{"records": [...]}`
// - `add-record`    params `{domain, <record>}`  → the saved record
// - `edit-record`   params `{domain, id, <record>}`
// - `remove-record` params `{domain, id}`

use async_trait::async_trait;
use njalla_core::config::ProviderConfig;
use njalla_core::{Error, Record, RecordApi, RecordData, RecordId, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider name used in errors and logs
const PROVIDER: &str = "njalla";

/// Njalla JSON-RPC client
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct NjallaClient {
    /// Njalla API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// JSON-RPC endpoint
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for NjallaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NjallaClient")
            .field("api_token", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl NjallaClient {
    /// Create a client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {e}")))?;

        Self::with_client(client, config.endpoint.clone(), config.api_token.clone())
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Njalla API token cannot be empty"));
        }

        Ok(Self {
            api_token,
            endpoint: endpoint.into(),
            client,
        })
    }

    /// The JSON-RPC endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform one JSON-RPC call and return its `result`, if any
    async fn call_envelope<P, T>(&self, method: &str, params: P) -> Result<Option<T>>
    where
        P: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        tracing::debug!("Calling Njalla method {}", method);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Njalla {}", self.api_token))
            .header("Accept", "application/json")
            .json(&RpcRequest { method, params })
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, method));
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {e}")))?;

        if let Some(error) = envelope.error {
            tracing::debug!("Njalla method {} returned error {:?}", method, error.code);
            return Err(Error::provider(PROVIDER, error.message));
        }

        Ok(envelope.result)
    }

    /// Perform a call whose `result` is required
    async fn call<P, T>(&self, method: &str, params: P) -> Result<T>
    where
        P: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        self.call_envelope(method, params).await?.ok_or_else(|| {
            Error::provider(
                PROVIDER,
                format!("Invalid response format: {method} returned neither result nor error"),
            )
        })
    }

    /// Perform a call whose `result` carries nothing of interest
    async fn call_unit<P>(&self, method: &str, params: P) -> Result<()>
    where
        P: Serialize + Send,
    {
        let _: Option<serde::de::IgnoredAny> = self.call_envelope(method, params).await?;
        Ok(())
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: reqwest::StatusCode, body: &str, method: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {status}"
        )),
        429 => Error::rate_limited(format!("Please retry later. Status: {status}")),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Njalla server error (transient): {status} - {body}"),
        ),
        _ => Error::provider(PROVIDER, format!("{method} failed: {status} - {body}")),
    }
}

#[async_trait]
impl RecordApi for NjallaClient {
    async fn add_record(&self, domain: &str, record: &Record) -> Result<Record> {
        let wire = WireRecord::from(record);
        let saved: WireRecord = self
            .call(
                "add-record",
                DomainParams {
                    domain,
                    record: &wire,
                },
            )
            .await?;
        Record::try_from(saved)
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<Record>> {
        let listing: RecordList = self.call("list-records", DomainOnly { domain }).await?;
        tracing::debug!("Listed {} records for {}", listing.records.len(), domain);
        Ok(listing
            .records
            .into_iter()
            .filter_map(|raw| match decode_listed(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping undecodable record in {}: {}", domain, e);
                    None
                }
            })
            .collect())
    }

    async fn edit_record(&self, domain: &str, record: &Record) -> Result<()> {
        if record.id.is_none() {
            return Err(Error::invalid_input("edit-record requires a record id"));
        }
        let wire = WireRecord::from(record);
        self.call_unit(
            "edit-record",
            DomainParams {
                domain,
                record: &wire,
            },
        )
        .await
    }

    async fn remove_record(&self, domain: &str, id: RecordId) -> Result<()> {
        self.call_unit("remove-record", RemoveParams { domain, id }).await
    }

    fn api_name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Serialize)]
struct DomainOnly<'a> {
    domain: &'a str,
}

#[derive(Debug, Serialize)]
struct DomainParams<'a> {
    domain: &'a str,
    #[serde(flatten)]
    record: &'a WireRecord,
}

#[derive(Debug, Serialize)]
struct RemoveParams<'a> {
    domain: &'a str,
    id: RecordId,
}

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

/// Decode one entry of a listing on its own
fn decode_listed(raw: serde_json::Value) -> Result<Record> {
    let wire: WireRecord = serde_json::from_value(raw)
        .map_err(|e| Error::provider(PROVIDER, format!("Invalid record in listing: {e}")))?;
    Record::try_from(wire)
}

/// Flat record shape used on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct WireRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prio: Option<u32>,
}

impl From<&Record> for WireRecord {
    fn from(record: &Record) -> Self {
        let prio = match &record.data {
            RecordData::Mx { priority, .. } => Some(*priority),
            _ => None,
        };

        Self {
            id: record.id,
            name: record.name.clone(),
            kind: record.kind().to_string(),
            content: record.data.content().to_string(),
            ttl: record.ttl,
            prio,
        }
    }
}

impl TryFrom<WireRecord> for Record {
    type Error = Error;

    fn try_from(wire: WireRecord) -> Result<Self> {
        let content = wire.content;
        let data = match wire.kind.as_str() {
            "A" => RecordData::A { content },
            "AAAA" => RecordData::Aaaa { content },
            "CNAME" => RecordData::Cname { content },
            "TXT" => RecordData::Txt { content },
            "NS" => RecordData::Ns { content },
            "MX" => {
                let priority = wire.prio.ok_or_else(|| {
                    Error::provider(
                        PROVIDER,
                        format!(
                            "Invalid response format: MX record {} has no prio",
                            wire.id.map(|id| id.to_string()).unwrap_or_default()
                        ),
                    )
                })?;
                RecordData::Mx { priority, content }
            }
            _ => RecordData::Other {
                kind: wire.kind,
                content,
            },
        };

        Ok(Record {
            id: wire.id,
            name: wire.name,
            ttl: wire.ttl,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_token_rejected() {
        let result = NjallaClient::with_client(reqwest::Client::new(), "http://localhost", "  ");
        assert!(matches!(result, Err(Error::Config(_))));

        assert!(NjallaClient::new(&ProviderConfig::new("")).is_err());
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let client = NjallaClient::new(&ProviderConfig::new("secret_token_12345")).unwrap();
        let debug_str = format!("{client:?}");
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("NjallaClient"));
    }

    #[test]
    fn test_add_params_are_flat() {
        let wire = WireRecord::from(&Record::mx("@", 3600, 10, "mail.example.com"));
        let params = serde_json::to_value(DomainParams {
            domain: "example.com",
            record: &wire,
        })
        .unwrap();

        assert_eq!(
            params,
            json!({
                "domain": "example.com",
                "name": "@",
                "type": "MX",
                "content": "mail.example.com",
                "ttl": 3600,
                "prio": 10
            })
        );
    }

    #[test]
    fn test_non_mx_omits_prio() {
        let record = Record {
            id: Some(3),
            name: "www".to_string(),
            ttl: 300,
            data: RecordData::A {
                content: "192.0.2.1".to_string(),
            },
        };
        let value = serde_json::to_value(WireRecord::from(&record)).unwrap();
        assert_eq!(value.get("prio"), None);
        assert_eq!(value["id"], json!(3));
    }

    #[test]
    fn test_decode_variants() {
        let mx: WireRecord = serde_json::from_value(json!({
            "id": 42, "name": "@", "type": "MX", "content": "mx.example.com",
            "ttl": 3600, "prio": 10
        }))
        .unwrap();
        assert_eq!(
            Record::try_from(mx).unwrap(),
            Record::mx("@", 3600, 10, "mx.example.com").with_id(42)
        );

        let srv: WireRecord = serde_json::from_value(json!({
            "id": 5, "name": "_sip._tcp", "type": "SRV", "content": "sip.example.com",
            "ttl": 60, "prio": 10, "weight": 5, "port": 5060
        }))
        .unwrap();
        let srv = Record::try_from(srv).unwrap();
        assert_eq!(srv.kind(), "SRV");
    }

    #[test]
    fn test_mx_without_prio_is_rejected() {
        let wire: WireRecord = serde_json::from_value(json!({
            "id": 1, "name": "@", "type": "MX", "content": "mx.example.com", "ttl": 60
        }))
        .unwrap();
        assert!(matches!(Record::try_from(wire), Err(Error::Provider { .. })));
    }

    #[test]
    fn test_listed_entry_without_ttl_decodes() {
        let record = decode_listed(json!({
            "id": 43, "type": "Redirect", "name": "www", "content": "https://example.org"
        }))
        .unwrap();
        assert_eq!(record.kind(), "Redirect");
        assert_eq!(record.ttl, 0);

        assert!(decode_listed(json!({ "id": 44, "name": "x" })).is_err());
    }

    #[test]
    fn test_status_mapping() {
        use reqwest::StatusCode;

        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "", "list-records"),
            Error::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", "list-records"),
            Error::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "", "list-records"),
            Error::Provider { .. }
        ));
    }
}
