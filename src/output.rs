//! Output channel
//!
//! - All JSON Lines include schema version (v: 1)
//! - stdout = results only (JSON Lines in agent mode)
//! - stderr = human logs

use serde::Serialize;
use serde_json::{json, Value};

use crate::api::ApiError;
use crate::cloudprovider::CloudError;
use crate::config::ConfigError;
use crate::options::ParamsError;

const SCHEMA_VERSION: u8 = 1;

/// Event wrapper with schema version
#[derive(Serialize)]
struct Event<T: Serialize> {
    v: u8,
    #[serde(rename = "type")]
    event_type: String,
    payload: T,
}

fn emit<T: Serialize>(event_type: &str, payload: T) {
    let event = Event {
        v: SCHEMA_VERSION,
        event_type: event_type.to_string(),
        payload,
    };
    match serde_json::to_string(&event) {
        Ok(line) => println!("{}", line),
        Err(e) => eprintln!("[ERROR] failed to encode {} event: {}", event_type, e),
    }
}

/// Output handler
pub struct Output {
    agent_mode: bool,
    verbose: bool,
}

impl Output {
    pub fn new(agent_mode: bool, verbose: bool) -> Self {
        Self {
            agent_mode,
            verbose,
        }
    }

    /// Log message (stderr for human, JSON Lines for agent)
    pub fn log(&self, level: &str, message: &str) {
        if self.agent_mode {
            emit("log", json!({"level": level, "message": message}));
        } else {
            eprintln!("[{}] {}", level.to_uppercase(), message);
        }
    }

    /// Debug line, only with --verbose
    pub fn debug(&self, message: &str) {
        if self.verbose {
            self.log("debug", message);
        }
    }

    /// Progress update
    pub fn progress(&self, percent: u8, message: &str) {
        if self.agent_mode {
            emit("progress", json!({"percent": percent, "message": message}));
        } else {
            eprintln!("[{:3}%] {}", percent, message);
        }
    }

    /// Final result
    pub fn result<T: Serialize>(&self, data: T) {
        if self.agent_mode {
            emit("result", data);
        } else {
            match serde_json::to_string_pretty(&data) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("[ERROR] failed to encode result: {}", e),
            }
        }
    }

    /// Error output; exits the process
    pub fn error(&self, err: CliError) -> ! {
        if self.agent_mode {
            emit("error", &err);
        } else {
            eprintln!(
                "Error [{}][{}]: {}",
                err.cat,
                err.code,
                err.message.as_deref().unwrap_or("")
            );
            if err.retryable {
                if let Some(s) = err.retry_after_s {
                    eprintln!("  Retry after: {}s", s);
                }
            }
            eprintln!("  Fix: {:?}", err.fix);
        }
        std::process::exit(err.exit_code());
    }
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub cat: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_s: Option<u32>,
    pub fix: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl CliError {
    fn new(code: &str, cat: &str, message: &str, retry_after_s: Option<u32>, fix: &[&str]) -> Self {
        Self {
            code: code.into(),
            cat: cat.into(),
            op: None,
            retryable: retry_after_s.is_some(),
            retry_after_s,
            fix: fix.iter().map(|f| f.to_string()).collect(),
            message: Some(message.into()),
            details: None,
        }
    }

    /// Network error
    pub fn net(code: &str, message: &str) -> Self {
        Self::new(code, "net", message, Some(5), &["proxy", "wait"])
    }

    /// Input error
    pub fn input(code: &str, message: &str) -> Self {
        Self::new(code, "in", message, None, &["param"])
    }

    /// Auth error
    pub fn auth(code: &str, message: &str) -> Self {
        Self::new(code, "auth", message, None, &["auth"])
    }

    /// External service error
    pub fn ext(code: &str, message: &str) -> Self {
        Self::new(code, "ext", message, Some(5), &["wait", "report"])
    }

    /// System error
    pub fn sys(code: &str, message: &str) -> Self {
        Self::new(code, "sys", message, None, &["report"])
    }

    /// Timeout error
    pub fn timeout(code: &str, message: &str, retry_after: u32) -> Self {
        Self::new(code, "time", message, Some(retry_after), &["wait"])
    }

    /// Operation the provider does not offer through this tool
    pub fn unsupported(code: &str, message: &str) -> Self {
        Self::new(code, "unsup", message, None, &["other_tool"])
    }

    /// Add operation context
    pub fn with_op(mut self, op: &str) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add details
    pub fn with_details<T: Serialize>(mut self, details: T) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Get exit code based on category
    pub fn exit_code(&self) -> i32 {
        match self.cat.as_str() {
            "in" => 1,
            "auth" => 3,
            "time" => 4,
            "unsup" => 5,
            _ => 2,
        }
    }

    /// Classify an error coming out of a command handler
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{:#}", err);
        for cause in err.chain() {
            if cause.downcast_ref::<ParamsError>().is_some() {
                return Self::input("INVALID_OPTIONS", &message);
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::auth("MISSING_CONFIG", &message);
            }
            if let Some(e) = cause.downcast_ref::<CloudError>() {
                return Self::from_cloud(e, &message);
            }
            if let Some(e) = cause.downcast_ref::<ApiError>() {
                return Self::from_api(e, &message);
            }
            if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
                return Self::from_http(e, &message);
            }
        }
        Self::sys("INTERNAL", &message)
    }

    fn from_http(err: &reqwest::Error, message: &str) -> Self {
        if err.is_timeout() {
            Self::timeout("TIMEOUT", message, 10)
        } else {
            Self::net("HTTP_ERROR", message)
        }
    }

    fn from_cloud(err: &CloudError, message: &str) -> Self {
        match err {
            CloudError::NotImplemented(_) => Self::unsupported("NOT_IMPLEMENTED", message),
            CloudError::NotSupported(_) => Self::unsupported("NOT_SUPPORTED", message),
            CloudError::NotFound(_) => Self::input("NOT_FOUND", message),
            CloudError::Config(_) => Self::auth("MISSING_CREDENTIALS", message),
            CloudError::Api { code: 401 | 403, .. } => Self::auth("PROVIDER_AUTH", message),
            CloudError::Api { request_id, .. } => Self::ext("PROVIDER_API_ERROR", message)
                .with_details(json!({"request_id": request_id})),
            CloudError::Http(e) => Self::from_http(e, message),
            CloudError::Decode(_) => Self::ext("PROVIDER_DECODE", message),
        }
    }

    fn from_api(err: &ApiError, message: &str) -> Self {
        match err {
            e if e.is_auth() => Self::auth("REGION_AUTH", message),
            ApiError::Status { status, .. } if *status == 404 => Self::input("NOT_FOUND", message),
            ApiError::Status { status, .. } if *status < 500 => Self::input("BAD_REQUEST", message),
            ApiError::Status { .. } => Self::ext("REGION_API_ERROR", message),
            ApiError::Http(e) => Self::from_http(e, message),
            ApiError::Decode(_) => Self::ext("REGION_DECODE", message),
            ApiError::Config(_) => Self::auth("MISSING_CONFIG", message),
        }
    }
}

fn action(id: &str, summary: &str, args: Value, options: Value) -> Value {
    json!({"id": id, "summary": summary, "args": args, "options": options})
}

/// Print manifest (--manifest)
pub fn print_manifest() {
    let id_arg = json!([{"name": "id", "type": "string", "required": true}]);
    let ids_arg = json!([{"name": "ids", "type": "string[]", "required": true}]);
    let list_opts = json!([
        {"name": "limit", "type": "integer", "default": 20},
        {"name": "offset", "type": "integer"},
        {"name": "search", "type": "string"},
        {"name": "filter", "type": "string[]"},
        {"name": "scope", "type": "string"},
        {"name": "tags", "type": "string[]"}
    ]);
    let region_opt = json!([{"name": "region", "type": "string", "default": "cn-north-1"}]);
    let region_id_opts = json!([
        {"name": "region", "type": "string", "default": "cn-north-1"},
        {"name": "id", "type": "string", "required": true}
    ]);

    let actions = vec![
        action("server.list", "List servers", json!([]), list_opts.clone()),
        action("server.show", "Show server details", id_arg.clone(), json!([])),
        action(
            "server.create",
            "Create servers",
            json!([{"name": "name", "type": "string", "required": true}]),
            json!([
                {"name": "mem-spec", "type": "string", "required": true},
                {"name": "ncpu", "type": "integer"},
                {"name": "disk", "type": "string[]"},
                {"name": "net", "type": "string[]"},
                {"name": "count", "type": "integer", "default": 1}
            ]),
        ),
        action("server.update", "Update server attributes", ids_arg.clone(), json!([])),
        action("server.start", "Start servers", ids_arg.clone(), json!([])),
        action("server.stop", "Stop servers", ids_arg.clone(), json!([{"name": "force", "type": "bool"}])),
        action("server.delete", "Delete servers", ids_arg.clone(), json!([])),
        action("server.deploy", "Deploy keys/passwords/files", ids_arg.clone(), json!([])),
        action("server.metadata", "Set server metadata tags", id_arg.clone(), json!([])),
        action("server.batch-metadata", "Set metadata tags on many servers", json!([]), json!([])),
        action("host.list", "List hosts", json!([]), list_opts.clone()),
        action("host.show", "Show host details", id_arg.clone(), json!([])),
        action("cloud-account.list", "List cloud accounts", json!([]), list_opts),
        action("cloud-account.create-jdcloud", "Register a JD Cloud account", json!([]), json!([])),
        action("cloud-account.create-aliyun", "Register an Aliyun account", json!([]), json!([])),
        action("pod.create", "Create a container pod", json!([]), json!([])),
        action("jd.region.list", "List JD Cloud regions", json!([]), json!([])),
        action("jd.zone.list", "List zones of a region", json!([]), region_opt.clone()),
        action("jd.host.list", "List emulated hosts", json!([]), region_opt.clone()),
        action("jd.vm.list", "List instances", json!([]), region_opt.clone()),
        action("jd.vm.show", "Show an instance", json!([]), region_id_opts.clone()),
        action("jd.vm.start", "Start an instance", json!([]), region_id_opts.clone()),
        action("jd.vm.stop", "Stop an instance", json!([]), region_id_opts.clone()),
        action("jd.vm.delete", "Delete an instance", json!([]), region_id_opts.clone()),
        action("jd.disk.list", "List disks", json!([]), region_opt.clone()),
        action("jd.disk.show", "Show a disk", json!([]), region_id_opts.clone()),
        action("jd.vpc.list", "List VPCs", json!([]), region_opt.clone()),
        action("jd.network.list", "List subnets", json!([]), region_opt.clone()),
        action("jd.secgroup.list", "List security groups", json!([]), region_opt.clone()),
        action("jd.secgroup.show", "Show a security group", json!([]), region_id_opts.clone()),
        action("jd.snapshot.list", "List snapshots", json!([]), region_opt.clone()),
        action("jd.rds.list", "List RDS instances", json!([]), region_opt),
        action("jd.rds.show", "Show an RDS instance", json!([]), region_id_opts),
        action(
            "jd.metric",
            "Fetch instance metric data",
            json!([]),
            json!([
                {"name": "id", "type": "string", "required": true},
                {"name": "metric", "type": "string", "default": "cpu_util"},
                {"name": "minutes", "type": "integer", "default": 60}
            ]),
        ),
    ];

    let manifest = json!({
        "schema_version": "1.0",
        "tool": {
            "name": "climc",
            "display_name": "Cloud management CLI",
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION")
        },
        "capabilities": {
            "agent": true,
            "interactive": false,
            "streaming": false,
            "resume": false,
            "dry_run": true
        },
        "actions": actions,
        "permissions": {
            "network": true,
            "network_domains": ["$CLIMC_REGION_URL", "*.jdcloud-api.com"],
            "filesystem": {
                "read": ["$CLIMC_PROJECT_DIR/.env"],
                "write": []
            },
            "env_vars": [
                "CLIMC_PROJECT_DIR",
                "CLIMC_REGION_URL",
                "CLIMC_AUTH_TOKEN",
                "JDCLOUD_ACCESS_KEY_ID",
                "JDCLOUD_ACCESS_KEY_SECRET",
                "JDCLOUD_ENDPOINT_SUFFIX",
                "JDCLOUD_SCHEME",
                "JDCLOUD_TIMEOUT_SECS"
            ]
        },
        "limits": {
            "default_timeout_s": 30,
            "max_output_mb": 10
        }
    });

    match serde_json::to_string_pretty(&manifest) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("[ERROR] failed to encode manifest: {}", e),
    }
}
