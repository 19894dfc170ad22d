//! Region service REST client
//!
//! Option structs produce [`Params`]; a [`Manager`] turns them into a
//! [`Request`] for its resource collection and [`Client`] sends it.

use reqwest::Method;
use serde_json::{json, Value};
use thiserror::Error;

use crate::options::Params;

pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("region service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Config(String),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Status { status: 401 | 403, .. })
    }
}

/// A resource collection of the region service
#[derive(Debug, Clone, Copy)]
pub struct Manager {
    pub keyword: &'static str,
    pub keyword_plural: &'static str,
}

/// Pods are servers with hypervisor `pod`, so they share this manager
pub const SERVERS: Manager = Manager {
    keyword: "server",
    keyword_plural: "servers",
};

pub const HOSTS: Manager = Manager {
    keyword: "host",
    keyword_plural: "hosts",
};

pub const CLOUDACCOUNTS: Manager = Manager {
    keyword: "cloudaccount",
    keyword_plural: "cloudaccounts",
};

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    /// Printable form used by `--dry-run`
    pub fn to_json(&self) -> Value {
        json!({
            "method": self.method.as_str(),
            "path": self.path,
            "query": self.query.iter().map(|(k, v)| json!([k, v])).collect::<Vec<_>>(),
            "body": self.body,
        })
    }
}

impl Manager {
    fn wrap(&self, params: Params) -> Value {
        let mut body = Params::new();
        body.insert(self.keyword.to_string(), Value::Object(params));
        Value::Object(body)
    }

    pub fn list(&self, params: &Params) -> Request {
        Request {
            method: Method::GET,
            path: format!("/{}", self.keyword_plural),
            query: query_pairs(params),
            body: None,
        }
    }

    pub fn get(&self, id: &str, params: &Params) -> Request {
        Request {
            method: Method::GET,
            path: format!("/{}/{}", self.keyword_plural, id),
            query: query_pairs(params),
            body: None,
        }
    }

    pub fn create(&self, params: Params) -> Request {
        Request {
            method: Method::POST,
            path: format!("/{}", self.keyword_plural),
            query: Vec::new(),
            body: Some(self.wrap(params)),
        }
    }

    pub fn update(&self, id: &str, params: Params) -> Request {
        Request {
            method: Method::PUT,
            path: format!("/{}/{}", self.keyword_plural, id),
            query: Vec::new(),
            body: Some(self.wrap(params)),
        }
    }

    pub fn perform_action(&self, id: &str, action: &str, params: Params) -> Request {
        Request {
            method: Method::POST,
            path: format!("/{}/{}/{}", self.keyword_plural, id, action),
            query: Vec::new(),
            body: Some(self.wrap(params)),
        }
    }

    /// Action on the collection itself, e.g. `POST /servers/batch-user-metadata`
    pub fn perform_class_action(&self, action: &str, params: Params) -> Request {
        Request {
            method: Method::POST,
            path: format!("/{}/{}", self.keyword_plural, action),
            query: Vec::new(),
            body: Some(Value::Object(params)),
        }
    }

    pub fn delete(&self, id: &str, params: &Params) -> Request {
        Request {
            method: Method::DELETE,
            path: format!("/{}/{}", self.keyword_plural, id),
            query: query_pairs(params),
            body: None,
        }
    }
}

/// Flatten params into query pairs: arrays as `key.0`, objects as `key.sub`
pub fn query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten(key, value, &mut pairs);
    }
    pairs
}

fn flatten(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((key.to_string(), s.clone())),
        Value::Bool(_) | Value::Number(_) => pairs.push((key.to_string(), value.to_string())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(&format!("{}.{}", key, i), item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(&format!("{}.{}", key, sub), item, pairs);
            }
        }
    }
}

pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl Client {
    pub fn new(base_url: &str, token: &str) -> Result<Self, ApiError> {
        if base_url.is_empty() {
            return Err(ApiError::Config("region service URL is empty".into()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn url(&self, req: &Request) -> String {
        format!("{}{}", self.base_url, req.path)
    }

    pub async fn send(&self, req: &Request) -> Result<Value, ApiError> {
        let mut builder = self
            .http
            .request(req.method.clone(), self.url(req))
            .header(AUTH_TOKEN_HEADER, &self.token);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn query_flattening() {
        let p = params(json!({
            "limit": 20,
            "details": true,
            "name": "web",
            "status": ["running", "ready"],
            "tags": {"0": {"key": "env", "value": "prod"}},
            "skipped": null
        }));
        let mut pairs = query_pairs(&p);
        pairs.sort();
        let expected: Vec<(String, String)> = vec![
            ("details", "true"),
            ("limit", "20"),
            ("name", "web"),
            ("status.0", "running"),
            ("status.1", "ready"),
            ("tags.0.key", "env"),
            ("tags.0.value", "prod"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn request_builders() {
        let empty = Params::new();

        let list = SERVERS.list(&params(json!({"limit": 5})));
        assert_eq!(list.method, Method::GET);
        assert_eq!(list.path, "/servers");
        assert_eq!(list.query, vec![("limit".to_string(), "5".to_string())]);

        let get = HOSTS.get("h1", &empty);
        assert_eq!(get.path, "/hosts/h1");
        assert!(get.body.is_none());

        let create = CLOUDACCOUNTS.create(params(json!({"name": "jd"})));
        assert_eq!(create.method, Method::POST);
        assert_eq!(create.path, "/cloudaccounts");
        assert_eq!(create.body, Some(json!({"cloudaccount": {"name": "jd"}})));

        let update = SERVERS.update("s1", params(json!({"name": "new"})));
        assert_eq!(update.method, Method::PUT);
        assert_eq!(update.body, Some(json!({"server": {"name": "new"}})));

        let start = SERVERS.perform_action("s1", "start", empty.clone());
        assert_eq!(start.path, "/servers/s1/start");
        assert_eq!(start.body, Some(json!({"server": {}})));

        let batch = SERVERS.perform_class_action("batch-user-metadata", params(json!({"guests": ["a"]})));
        assert_eq!(batch.path, "/servers/batch-user-metadata");
        assert_eq!(batch.body, Some(json!({"guests": ["a"]})));

        let delete = SERVERS.delete("s1", &params(json!({"override_pending_delete": true})));
        assert_eq!(delete.method, Method::DELETE);
        assert_eq!(
            delete.query,
            vec![("override_pending_delete".to_string(), "true".to_string())]
        );
    }

    #[test]
    fn dry_run_rendering() {
        let req = SERVERS.perform_action("s1", "stop", params(json!({"is_force": true})));
        assert_eq!(
            req.to_json(),
            json!({
                "method": "POST",
                "path": "/servers/s1/stop",
                "query": [],
                "body": {"server": {"is_force": true}}
            })
        );
    }

    #[test]
    fn client_requires_url() {
        assert!(matches!(Client::new("", "t"), Err(ApiError::Config(_))));
        let client = Client::new("http://region:8889/", "t").unwrap();
        assert_eq!(client.url(&HOSTS.list(&Params::new())), "http://region:8889/hosts");
    }

    #[test]
    fn auth_statuses() {
        assert!(ApiError::Status { status: 401, body: String::new() }.is_auth());
        assert!(!ApiError::Status { status: 500, body: String::new() }.is_auth());
    }

    #[tokio::test]
    async fn send_decodes_json_and_keeps_error_body() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", mockito::Matcher::Regex(r"^/servers(\?.*)?$".into()))
            .match_query(mockito::Matcher::UrlEncoded("limit".into(), "5".into()))
            .match_header("X-Auth-Token", "tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"servers": [{"id": "s1"}], "total": 1}"#)
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/servers/nope")
            .with_status(404)
            .with_body("server nope not found")
            .create_async()
            .await;
        let bad = server
            .mock("PUT", "/servers/s1")
            .match_body(mockito::Matcher::Json(json!({"server": {"name": ""}})))
            .with_status(400)
            .with_body(r#"{"error": "empty name"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "tok").unwrap();
        let value = client.send(&SERVERS.list(&params(json!({"limit": 5})))).await.unwrap();
        assert_eq!(value, json!({"servers": [{"id": "s1"}], "total": 1}));

        match client.send(&SERVERS.get("nope", &Params::new())).await {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "server nope not found");
            }
            other => panic!("unexpected {:?}", other),
        }

        match client.send(&SERVERS.update("s1", params(json!({"name": ""})))).await {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("empty name"));
            }
            other => panic!("unexpected {:?}", other),
        }

        list.assert_async().await;
        missing.assert_async().await;
        bad.assert_async().await;
    }
}
