//! Host options

use clap::Args;
use serde::Serialize;
use serde_json::json;

use super::{list_struct_to_params, BaseListOptions, ListOptions, Options, Params, ParamsError};

#[derive(Args, Serialize, Debug, Default)]
pub struct HostListOptions {
    /// List hosts in schedtag
    #[arg(long)]
    pub schedtag: Option<String>,

    /// List hosts in zone
    #[arg(long)]
    pub zone: Option<String>,

    /// List hosts in region
    #[arg(long)]
    pub region: Option<String>,

    /// List hosts in wire
    #[arg(long)]
    pub wire: Option<String>,

    /// List hosts that cached the image
    #[arg(long)]
    #[serde(rename = "cachedimage")]
    pub image: Option<String>,

    /// List hosts attached to storages
    #[arg(long)]
    pub storage: Option<String>,

    /// List hosts that are managed by the baremetal system
    #[arg(long, value_parser = ["true", "false"])]
    pub baremetal: Option<String>,

    /// Show empty hosts
    #[arg(long, conflicts_with = "occupied")]
    #[serde(skip)]
    pub empty: bool,

    /// Show occupied hosts
    #[arg(long)]
    #[serde(skip)]
    pub occupied: bool,

    /// Show enabled hosts only
    #[arg(long, conflicts_with = "disabled")]
    #[serde(skip)]
    pub enabled: bool,

    /// Show disabled hosts only
    #[arg(long)]
    #[serde(skip)]
    pub disabled: bool,

    /// Host type filter
    #[arg(long, value_parser = [
        "baremetal", "hypervisor", "esxi", "kubelet", "hyperv", "aliyun", "azure", "qcloud",
        "aws", "huawei", "ucloud", "google", "ctyun", "jdcloud",
    ])]
    pub host_type: Option<String>,

    /// MAC matches one of the host's interfaces
    #[arg(long)]
    pub any_mac: Option<String>,

    /// Filter host list by is_baremetal
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub is_baremetal: Option<bool>,

    /// Resource type
    #[arg(long, value_parser = ["shared", "prepaid", "dedicated"])]
    pub resource_type: Option<String>,

    /// List usable hosts only
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub usable: Option<bool>,

    /// Filter hosts by hypervisor
    #[arg(long)]
    pub hypervisor: Option<String>,

    /// Find host with the given system uuid
    #[arg(long)]
    pub uuid: Option<String>,

    /// Find host by SN
    #[arg(long)]
    pub sn: Option<String>,

    /// Filter hosts by cdrom_boot
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub cdrom_boot: Option<bool>,

    #[command(flatten)]
    #[serde(flatten)]
    pub base: BaseListOptions,
}

impl ListOptions for HostListOptions {
    fn base(&self) -> &BaseListOptions {
        &self.base
    }
}

impl Options for HostListOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        let mut params = list_struct_to_params(self)?;
        if self.empty {
            params.insert("is_empty".into(), json!(true));
        } else if self.occupied {
            params.insert("is_empty".into(), json!(false));
        }
        if self.enabled {
            params.insert("enabled".into(), json!(1));
        } else if self.disabled {
            params.insert("enabled".into(), json!(0));
        }
        Ok(params)
    }
}

#[derive(Args, Debug, Default)]
pub struct HostShowOptions {
    /// ID or name of host
    #[arg(value_name = "HOST")]
    pub id: String,
}
