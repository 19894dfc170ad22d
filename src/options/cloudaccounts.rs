//! Cloud account options

use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};

use super::{
    is_false, list_struct_to_params, struct_to_params, BaseListOptions, ListOptions, Options,
    Params, ParamsError,
};

#[derive(Args, Serialize, Debug, Default)]
pub struct CloudaccountListOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub base: BaseListOptions,

    /// Capability filter
    #[arg(long, value_parser = [
        "project", "compute", "network", "loadbalancer", "objectstore", "rds", "cache", "event",
        "tablestore",
    ])]
    pub capability: Vec<String>,

    /// Proxy setting ID or name
    #[arg(long)]
    pub proxy_setting: Option<String>,

    /// Order by host count
    #[arg(long, value_parser = ["asc", "desc"])]
    pub order_by_host_count: Option<String>,

    /// Order by guest count
    #[arg(long, value_parser = ["asc", "desc"])]
    pub order_by_guest_count: Option<String>,
}

impl ListOptions for CloudaccountListOptions {
    fn base(&self) -> &BaseListOptions {
        &self.base
    }
}

impl Options for CloudaccountListOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        list_struct_to_params(self)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct CloudaccountCreateBaseOptions {
    /// Name of cloud account
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Description
    #[arg(long)]
    #[serde(rename = "description")]
    pub desc: Option<String>,

    /// Brand of cloud account
    #[arg(long)]
    pub brand: Option<String>,

    /// Enable the account with same name project
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub auto_create_project: bool,

    /// Enable automatically synchronize resources of this account
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub enable_auto_sync: bool,

    /// Interval to synchronize if auto sync is enabled
    #[arg(long, value_name = "SECONDS")]
    pub sync_interval_seconds: Option<u32>,

    /// Project for this account
    #[arg(long)]
    pub project: Option<String>,

    /// Domain for this account
    #[arg(long)]
    pub project_domain: Option<String>,

    /// Create cloud account with disabled status
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub disabled: Option<bool>,

    /// Skip check duplicate account
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub skip_duplicate_account_check: bool,

    /// Proxy setting ID or name
    #[arg(long)]
    pub proxy_setting: Option<String>,

    /// Ask the region service to only test the account params
    #[arg(id = "test_create", long = "test-create")]
    #[serde(skip_serializing_if = "is_false")]
    pub dry_run: bool,

    /// Read only account
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,

    /// Skip sync resource, e.g. snapshot
    #[arg(long)]
    pub skip_sync_resources: Vec<String>,
}

#[derive(Args, Serialize, Debug, Default)]
pub struct AccessKeyCredential {
    /// Access key id
    #[arg(value_name = "ACCESS_KEY_ID")]
    pub access_key_id: String,

    /// Access key secret
    #[arg(value_name = "ACCESS_KEY_SECRET")]
    pub access_key_secret: String,
}

#[derive(Args, Serialize, Debug, Default)]
pub struct JdcloudCloudaccountCreateOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub base: CloudaccountCreateBaseOptions,

    #[command(flatten)]
    #[serde(flatten)]
    pub credential: AccessKeyCredential,
}

impl Options for JdcloudCloudaccountCreateOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        let mut params = struct_to_params(self)?;
        params.insert("provider".into(), json!("JDcloud"));
        Ok(params)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct AliyunCloudaccountCreateOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub base: CloudaccountCreateBaseOptions,

    #[command(flatten)]
    #[serde(flatten)]
    pub credential: AccessKeyCredential,

    /// Cloud environment
    #[arg(long, value_parser = ["InternationalCloud", "FinanceCloud"], default_value = "InternationalCloud")]
    pub environment: String,

    /// Bucket that stores billing report
    #[arg(long)]
    #[serde(skip)]
    pub options_billing_report_bucket: Option<String>,

    /// ID of account that can access the bucket, blank if this account can
    #[arg(long)]
    #[serde(skip)]
    pub options_billing_bucket_account: Option<String>,

    /// Prefix of billing file name
    #[arg(long)]
    #[serde(skip)]
    pub options_billing_file_prefix: Option<String>,
}

impl Options for AliyunCloudaccountCreateOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        let mut params = struct_to_params(self)?;
        params.insert("provider".into(), json!("Aliyun"));

        let billing = [
            ("billing_report_bucket", &self.options_billing_report_bucket),
            ("billing_bucket_account", &self.options_billing_bucket_account),
            ("billing_file_prefix", &self.options_billing_file_prefix),
        ];
        let options: Params = billing
            .iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (key.to_string(), json!(v)))
            })
            .collect();
        if !options.is_empty() {
            params.insert("options".into(), Value::Object(options));
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> AccessKeyCredential {
        AccessKeyCredential {
            access_key_id: "ak".into(),
            access_key_secret: "sk".into(),
        }
    }

    #[test]
    fn jdcloud_create_adds_provider() {
        let opts = JdcloudCloudaccountCreateOptions {
            base: CloudaccountCreateBaseOptions {
                name: "jd-prod".into(),
                desc: Some("production".into()),
                enable_auto_sync: true,
                ..Default::default()
            },
            credential: credential(),
        };
        let params = opts.params().unwrap();
        assert_eq!(
            Value::Object(params),
            json!({
                "name": "jd-prod",
                "description": "production",
                "enable_auto_sync": true,
                "access_key_id": "ak",
                "access_key_secret": "sk",
                "provider": "JDcloud"
            })
        );
    }

    #[test]
    fn aliyun_billing_options_are_nested_only_when_set() {
        let mut opts = AliyunCloudaccountCreateOptions {
            base: CloudaccountCreateBaseOptions { name: "ali".into(), ..Default::default() },
            credential: credential(),
            environment: "InternationalCloud".into(),
            ..Default::default()
        };
        let params = opts.params().unwrap();
        assert!(!params.contains_key("options"));
        assert_eq!(params["environment"], json!("InternationalCloud"));

        opts.options_billing_report_bucket = Some("bills".into());
        let params = opts.params().unwrap();
        assert_eq!(params["options"], json!({"billing_report_bucket": "bills"}));
    }

    #[test]
    fn list_keeps_capabilities() {
        let opts = CloudaccountListOptions {
            capability: vec!["compute".into(), "rds".into()],
            base: BaseListOptions { limit: 5, ..Default::default() },
            ..Default::default()
        };
        let params = opts.params().unwrap();
        assert_eq!(
            Value::Object(params),
            json!({"capability": ["compute", "rds"], "limit": 5})
        );
    }
}
