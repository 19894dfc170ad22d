//! Common list options and their post-processing

use clap::Args;
use serde::Serialize;
use serde_json::Value;

use super::{struct_to_params, Params, ParamsError};

const USER_TAG_PREFIX: &str = "user:";
const CLOUD_TAG_PREFIX: &str = "ext:";

/// Options that embed [`BaseListOptions`]
pub trait ListOptions {
    fn base(&self) -> &BaseListOptions;
}

#[derive(Args, Serialize, Debug, Clone, Default)]
pub struct BaseListOptions {
    /// Resource scope
    #[arg(long, value_parser = ["system", "domain", "project", "user"])]
    pub scope: Option<String>,

    /// Page limit
    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Page offset
    #[arg(long)]
    pub offset: Option<u32>,

    /// Name of the field to be ordered by
    #[arg(long)]
    pub order_by: Vec<String>,

    /// List order
    #[arg(long, value_parser = ["desc", "asc"])]
    pub order: Option<String>,

    /// Show more details
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub details: Option<bool>,

    /// Show fail reason fields
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub show_fail_reason: Option<bool>,

    /// Filter results by a simple keyword search
    #[arg(long)]
    pub search: Option<String>,

    /// Piggyback metadata information
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub meta: Option<bool>,

    /// Filters, e.g. name.contains(web)
    #[arg(long)]
    pub filter: Vec<String>,

    /// Filters on a joint table
    #[arg(long)]
    pub joint_filter: Vec<String>,

    /// Match if any of the filters matches instead of all
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub filter_any: Option<bool>,

    /// Is an admin call?
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub admin: Option<bool>,

    /// Tenant ID or name
    #[arg(long, alias = "project")]
    pub tenant: Option<String>,

    /// Project domain filter
    #[arg(long)]
    pub project_domain: Option<String>,

    /// User ID or name
    #[arg(long)]
    pub user: Option<String>,

    /// Show only specified fields
    #[arg(long)]
    pub field: Vec<String>,

    /// Show all resources including the emulated ones
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub show_emulated: Option<bool>,

    /// Tag filters, e.g. hypervisor=aliyun
    #[arg(long)]
    #[serde(skip)]
    pub tags: Vec<String>,

    /// User tag filters
    #[arg(long)]
    #[serde(skip)]
    pub user_tags: Vec<String>,

    /// Cloud tag filters
    #[arg(long)]
    #[serde(skip)]
    pub cloud_tags: Vec<String>,

    /// Show resources without any tag
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub no_tag: Option<bool>,

    /// Show resources without user tags
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub no_user_tag: Option<bool>,

    /// Show resources without cloud tags
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub no_cloud_tag: Option<bool>,

    /// List objects belonging to the cloud provider
    #[arg(long)]
    pub manager: Vec<String>,

    /// List objects belonging to the cloud account
    #[arg(long)]
    pub account: Vec<String>,

    /// List objects from the provider
    #[arg(long, value_parser = [
        "OneCloud", "VMware", "Aliyun", "Qcloud", "Azure", "Aws", "Huawei",
        "OpenStack", "Ucloud", "ZStack", "Google", "Ctyun", "JDcloud",
    ])]
    pub provider: Vec<String>,

    /// List objects belonging to the brand
    #[arg(long)]
    pub brand: Vec<String>,

    /// Cloud environment
    #[arg(long, value_parser = ["public", "private", "onpremise", "private_or_onpremise"])]
    pub cloud_env: Option<String>,

    /// List objects belonging to public cloud
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub public_cloud: Option<bool>,

    /// List objects belonging to private cloud
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub private_cloud: Option<bool>,

    /// List objects on premise
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub is_on_premise: Option<bool>,

    /// List objects managed by an external provider
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub is_managed: Option<bool>,

    /// Marker for marker-based paging
    #[arg(long)]
    pub paging_marker: Option<String>,

    /// Show only pending deleted objects
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pending_delete: Option<bool>,

    /// Show also pending deleted objects
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    #[serde(skip)]
    pub pending_delete_all: Option<bool>,

    /// Show also deleted records
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    #[serde(skip)]
    pub delete_all: Option<bool>,

    /// Filter by ids
    #[arg(long)]
    pub id: Vec<String>,

    /// Filter by names
    #[arg(long)]
    pub name: Vec<String>,
}

fn is_true(flag: Option<bool>) -> bool {
    flag.unwrap_or(false)
}

impl BaseListOptions {
    /// Apply list post-processing to params produced by [`struct_to_params`].
    pub fn finalize(&self, params: &mut Params) -> Result<(), ParamsError> {
        if self.filter.is_empty() {
            params.remove("filter_any");
        }

        if !is_true(self.admin) {
            let requires_system = self.tenant.as_deref().is_some_and(|s| !s.is_empty())
                || self.project_domain.as_deref().is_some_and(|s| !s.is_empty())
                || is_true(self.pending_delete)
                || is_true(self.pending_delete_all)
                || self.scope.as_deref() == Some("system");
            if requires_system {
                params.insert("admin".into(), Value::Bool(true));
            }
        }

        if is_true(self.pending_delete_all) {
            params.insert("pending_delete".into(), Value::String("all".into()));
        }
        if is_true(self.delete_all) {
            params.insert("delete".into(), Value::String("all".into()));
        }

        let tagged = self
            .tags
            .iter()
            .map(|t| ("", t))
            .chain(self.user_tags.iter().map(|t| (USER_TAG_PREFIX, t)))
            .chain(self.cloud_tags.iter().map(|t| (CLOUD_TAG_PREFIX, t)));
        for (idx, (prefix, tag)) in tagged.enumerate() {
            let (key, value) = match tag.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (tag.as_str(), None),
            };
            if key.is_empty() {
                return Err(ParamsError::InvalidTag(tag.clone()));
            }
            params.insert(
                format!("tags.{}.key", idx),
                Value::String(format!("{}{}", prefix, key)),
            );
            if let Some(v) = value {
                params.insert(format!("tags.{}.value", idx), Value::String(v.to_string()));
            }
        }

        Ok(())
    }
}

impl ListOptions for BaseListOptions {
    fn base(&self) -> &BaseListOptions {
        self
    }
}

/// Convert list options into params, applying the common list rules.
pub fn list_struct_to_params<T>(opts: &T) -> Result<Params, ParamsError>
where
    T: Serialize + ListOptions,
{
    let mut params = struct_to_params(opts)?;
    opts.base().finalize(&mut params)?;
    Ok(params)
}
