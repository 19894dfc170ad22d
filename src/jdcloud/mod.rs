//! JD Cloud provider adapter
//!
//! Wraps the VM, Disk, VPC, RDS and Monitor services behind the
//! [`crate::cloudprovider`] traits. Only reads are implemented; every
//! mutation surfaces `CloudError::NotImplemented`.

pub mod auth;
pub mod dbinstance;
pub mod disk;
pub mod host;
pub mod instance;
pub mod monitor;
pub mod network;
pub mod region;
pub mod secgroup;
pub mod snapshot;
pub mod transport;
pub mod vpc;
pub mod zone;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::cloudprovider::status::{BILLING_TYPE_POSTPAID, BILLING_TYPE_PREPAID};
use crate::cloudprovider::{CloudError, Result};

pub use auth::Credential;
pub use region::JdRegion;
pub use transport::{ApiRequest, HttpTransport, Transport};

pub const PROVIDER: &str = "JDcloud";
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "jdcloud-api.com";
pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const PAGE_SIZE: u32 = 100;

/// Static region catalog entry
#[derive(Debug)]
pub struct RegionInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub city: &'static str,
    pub latitude: f32,
    pub longitude: f32,
    pub zones: &'static [&'static str],
}

pub const REGIONS: &[RegionInfo] = &[
    RegionInfo {
        id: "cn-north-1",
        name: "华北-北京",
        city: "Beijing",
        latitude: 39.9042,
        longitude: 116.4074,
        zones: &["cn-north-1a", "cn-north-1b", "cn-north-1c"],
    },
    RegionInfo {
        id: "cn-east-1",
        name: "华东-宿迁",
        city: "Suqian",
        latitude: 33.9630,
        longitude: 118.2752,
        zones: &["cn-east-1a"],
    },
    RegionInfo {
        id: "cn-east-2",
        name: "华东-上海",
        city: "Shanghai",
        latitude: 31.2304,
        longitude: 121.4737,
        zones: &["cn-east-2a", "cn-east-2b", "cn-east-2c"],
    },
    RegionInfo {
        id: "cn-south-1",
        name: "华南-广州",
        city: "Guangzhou",
        latitude: 23.1291,
        longitude: 113.2644,
        zones: &["cn-south-1a", "cn-south-1b", "cn-south-1c"],
    },
];

/// Connection settings for the JD Cloud OpenAPI
#[derive(Debug, Clone)]
pub struct JdCloudConfig {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub endpoint_suffix: String,
    pub scheme: String,
    pub timeout: Duration,
}

impl JdCloudConfig {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.into(),
            scheme: DEFAULT_SCHEME.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

pub struct JdCloudClient {
    access_key_id: String,
    transport: Box<dyn Transport>,
}

impl JdCloudClient {
    pub fn new(config: &JdCloudConfig) -> Result<Self> {
        if config.access_key_id.is_empty() || config.access_key_secret.is_empty() {
            return Err(CloudError::Config("access key id and secret are required".into()));
        }
        let transport = HttpTransport::new(
            Credential {
                access_key_id: config.access_key_id.clone(),
                access_key_secret: config.access_key_secret.clone(),
            },
            &config.scheme,
            &config.endpoint_suffix,
            config.timeout,
        )?;
        Ok(Self::with_transport(&config.access_key_id, Box::new(transport)))
    }

    pub fn with_transport(access_key_id: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            transport,
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Send a request and unwrap the `result` member of the envelope
    pub async fn request(&self, req: &ApiRequest) -> Result<Value> {
        let envelope = self.transport.send(req).await?;
        decode_envelope(envelope)
    }

    /// Send a request and decode `result.<key>`
    pub async fn get<T: DeserializeOwned>(&self, req: &ApiRequest, key: &str) -> Result<T> {
        let mut result = self.request(req).await?;
        match result.get_mut(key).map(Value::take) {
            Some(value) if !value.is_null() => Ok(serde_json::from_value(value)?),
            _ => Err(CloudError::NotFound(format!("{} {}", key, req.path))),
        }
    }

    /// Fetch every page of a list call and collect `result.<key>`
    pub async fn list_all<T: DeserializeOwned>(&self, req: &ApiRequest, key: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let mut paged = req.clone();
            paged.query.push(("pageNumber".into(), page.to_string()));
            paged.query.push(("pageSize".into(), PAGE_SIZE.to_string()));

            let mut result = self.request(&paged).await?;
            let total = result.get("totalCount").and_then(Value::as_u64).unwrap_or(0);
            let batch: Vec<T> = match result.get_mut(key).map(Value::take) {
                Some(value) if !value.is_null() => serde_json::from_value(value)?,
                _ => Vec::new(),
            };
            let fetched = batch.len();
            items.extend(batch);

            if fetched == 0 || items.len() as u64 >= total {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

/// Regions of the static catalog bound to a shared client
pub fn regions(client: Arc<JdCloudClient>) -> Vec<JdRegion> {
    REGIONS
        .iter()
        .map(|info| JdRegion::new(client.clone(), info))
        .collect()
}

pub fn region(client: Arc<JdCloudClient>, id: &str) -> Result<JdRegion> {
    REGIONS
        .iter()
        .find(|info| info.id == id)
        .map(|info| JdRegion::new(client, info))
        .ok_or_else(|| CloudError::NotFound(format!("region {}", id)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Envelope {
    request_id: String,
    result: Option<Value>,
    error: Option<EnvelopeError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvelopeError {
    code: i64,
    status: String,
    message: String,
}

fn decode_envelope(raw: Value) -> Result<Value> {
    let envelope: Envelope = serde_json::from_value(raw)?;
    if let Some(err) = envelope.error {
        if err.code == 404 || err.status == "NOT_FOUND" {
            return Err(CloudError::NotFound(err.message));
        }
        return Err(CloudError::Api {
            code: err.code,
            status: err.status,
            message: err.message,
            request_id: envelope.request_id,
        });
    }
    Ok(envelope.result.unwrap_or(Value::Null))
}

/// Encode `filters.N.name` / `filters.N.values.M` query pairs (1-based)
pub fn filter_query(filters: &[(&str, &[String])]) -> Vec<(String, String)> {
    let mut query = Vec::new();
    let mut n = 0;
    for (name, values) in filters {
        if values.is_empty() {
            continue;
        }
        n += 1;
        query.push((format!("filters.{}.name", n), name.to_string()));
        for (m, value) in values.iter().enumerate() {
            query.push((format!("filters.{}.values.{}", n, m + 1), value.clone()));
        }
    }
    query
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Charge {
    pub charge_mode: String,
    pub charge_status: String,
    pub charge_start_time: String,
    pub charge_expired_time: String,
    pub charge_retire_time: String,
}

impl Charge {
    pub fn billing_type(&self) -> &'static str {
        if self.charge_mode == "prepaid_by_duration" {
            BILLING_TYPE_PREPAID
        } else {
            BILLING_TYPE_POSTPAID
        }
    }

    pub fn expired_at(&self) -> Option<DateTime<Utc>> {
        if self.billing_type() == BILLING_TYPE_PREPAID {
            parse_time(&self.charge_expired_time)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

pub fn tags_to_map(tags: &[Tag]) -> HashMap<String, String> {
    tags.iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect()
}

/// Parse the provider's timestamps: RFC 3339, or a naive UTC datetime
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;

    /// In-memory transport serving canned envelopes keyed by `service path`
    #[derive(Clone, Default)]
    pub struct FakeTransport {
        responses: Arc<Mutex<HashMap<String, VecDeque<Value>>>>,
        requests: Arc<Mutex<Vec<ApiRequest>>>,
    }

    impl FakeTransport {
        /// Queue a successful response; the last one queued is served repeatedly
        pub fn ok(&self, service: &str, path: &str, result: Value) -> &Self {
            self.push(service, path, json!({"requestId": "req-1", "result": result}))
        }

        pub fn push(&self, service: &str, path: &str, envelope: Value) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .entry(format!("{} {}", service, path))
                .or_default()
                .push_back(envelope);
            self
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, req: &ApiRequest) -> Result<Value> {
            self.requests.lock().unwrap().push(req.clone());
            let key = format!("{} {}", req.service, req.path);
            let mut responses = self.responses.lock().unwrap();
            let queue = responses
                .get_mut(&key)
                .ok_or_else(|| CloudError::NotFound(format!("no canned response for {}", key)))?;
            let envelope = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            envelope.ok_or_else(|| CloudError::NotFound(key))
        }
    }

    pub fn client(fake: &FakeTransport) -> Arc<JdCloudClient> {
        Arc::new(JdCloudClient::with_transport("ak-test", Box::new(fake.clone())))
    }

    pub fn region(fake: &FakeTransport) -> JdRegion {
        super::region(client(fake), "cn-north-1").unwrap()
    }
}
