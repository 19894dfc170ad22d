//! Command handlers

pub mod cloudaccounts;
pub mod hosts;
pub mod jdcloud;
pub mod pods;
pub mod servers;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::api::{Client, Request};
use crate::config;
use crate::output::Output;

/// Send region service requests in order, or print them with `--dry-run`.
///
/// The first failure stops the batch.
pub async fn execute(op: &str, requests: Vec<Request>, dry_run: bool, out: &Output) -> Result<()> {
    if dry_run {
        out.result(json!({
            "success": true,
            "op": op,
            "dry_run": true,
            "requests": requests.iter().map(Request::to_json).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    config::load_env()?;
    let cfg = config::region_config()?;
    let client = Client::new(&cfg.url, &cfg.token)?;

    let data = send_all(&client, &requests, out).await?;
    out.result(json!({
        "success": true,
        "op": op,
        "data": data,
    }));
    Ok(())
}

async fn send_all(client: &Client, requests: &[Request], out: &Output) -> Result<Value> {
    let total = requests.len();
    let mut results = Vec::with_capacity(total);
    for (i, req) in requests.iter().enumerate() {
        out.debug(&format!("{} {} query={:?}", req.method, client.url(req), req.query));
        if let Some(body) = &req.body {
            out.debug(&format!("body: {}", body));
        }
        if total > 1 {
            out.progress(((i * 100) / total) as u8, &format!("{} {}", req.method, req.path));
        }
        let value = client
            .send(req)
            .await
            .with_context(|| format!("{} {} failed", req.method, req.path))?;
        results.push(value);
    }
    Ok(collapse(results))
}

fn collapse(mut results: Vec<Value>) -> Value {
    if results.len() == 1 {
        results.remove(0)
    } else {
        Value::Array(results)
    }
}
