//! HTTP transport for the JD Cloud OpenAPI

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use super::auth::{self, Credential, SignInput, HEADER_DATE, HEADER_NONCE};
use crate::cloudprovider::Result;

const CONTENT_TYPE_JSON: &str = "application/json";

/// One OpenAPI call, addressed as `{service}/{version}/regions/{region}/{path}`
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub service: &'static str,
    pub version: &'static str,
    pub region: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(service: &'static str, version: &'static str, region: &str, path: &str) -> Self {
        Self {
            method: Method::GET,
            service,
            version,
            region: region.to_string(),
            path: path.to_string(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query.extend(query);
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Path part of the URL, without host
    pub fn url_path(&self) -> String {
        format!(
            "/{}/regions/{}/{}",
            self.version,
            self.region,
            self.path.trim_start_matches('/')
        )
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response envelope
    async fn send(&self, req: &ApiRequest) -> Result<Value>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    credential: Credential,
    scheme: String,
    endpoint_suffix: String,
}

impl HttpTransport {
    pub fn new(
        credential: Credential,
        scheme: &str,
        endpoint_suffix: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credential,
            scheme: scheme.to_string(),
            endpoint_suffix: endpoint_suffix.to_string(),
        })
    }

    fn host(&self, service: &str) -> String {
        format!("{}.{}", service, self.endpoint_suffix)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: &ApiRequest) -> Result<Value> {
        let host = self.host(req.service);
        let path = auth::uri_encode(&req.url_path(), true);
        let query = auth::canonical_query(&req.query);
        let body = match &req.body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };

        let nonce = Uuid::new_v4().to_string();
        let signature = auth::sign(
            &self.credential,
            &SignInput {
                method: req.method.as_str(),
                host: &host,
                path: &path,
                query: &query,
                content_type: CONTENT_TYPE_JSON,
                body: &body,
                region: &req.region,
                service: req.service,
            },
            Utc::now(),
            &nonce,
        )?;

        let mut url = format!("{}://{}{}", self.scheme, host, path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let mut builder = self
            .client
            .request(req.method.clone(), &url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(HEADER_DATE, &signature.date)
            .header(HEADER_NONCE, &signature.nonce)
            .header(AUTHORIZATION, &signature.authorization);
        if req.body.is_some() {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_path_joins_version_region_and_path() {
        let req = ApiRequest::get("vm", "v1", "cn-north-1", "/instances/i-1");
        assert_eq!(req.url_path(), "/v1/regions/cn-north-1/instances/i-1");
    }

    #[test]
    fn params_accumulate() {
        let req = ApiRequest::get("monitor", "v2", "cn-north-1", "metrics/cpu_util/metricData")
            .param("serviceCode", "vm")
            .with_query(vec![("resourceId".into(), "i-1".into())]);
        assert_eq!(
            req.query,
            vec![
                ("serviceCode".to_string(), "vm".to_string()),
                ("resourceId".to_string(), "i-1".to_string()),
            ]
        );
        assert_eq!(req.method, Method::GET);
        assert!(req.body.is_none());
    }

    #[test]
    fn host_uses_endpoint_suffix() {
        let transport = HttpTransport::new(
            Credential {
                access_key_id: "ak".into(),
                access_key_secret: "sk".into(),
            },
            "https",
            "jdcloud-api.com",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(transport.host("vpc"), "vpc.jdcloud-api.com");
    }
}
