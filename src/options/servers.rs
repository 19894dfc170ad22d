//! Server (guest) options

use std::net::Ipv4Addr;

use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};

use super::{
    is_false, is_size, list_struct_to_params, parse_metadata_tags, parse_size_mb,
    struct_to_params, BaseListOptions, ListOptions, Options, Params, ParamsError,
};

const HYPERVISORS: [&str; 13] = [
    "kvm", "esxi", "baremetal", "container", "aliyun", "azure", "qcloud", "aws", "huawei",
    "openstack", "ucloud", "zstack", "jdcloud",
];

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerListOptions {
    /// Zone ID or name
    #[arg(long)]
    pub zone: Option<String>,

    /// Wire ID or name
    #[arg(long)]
    pub wire: Option<String>,

    /// Network ID or name
    #[arg(long)]
    pub network: Option<String>,

    /// Disk ID or name
    #[arg(long)]
    pub disk: Option<String>,

    /// Host ID or name
    #[arg(long)]
    pub host: Option<String>,

    /// Show baremetal servers
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub baremetal: Option<bool>,

    /// Show gpu servers
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub gpu: Option<bool>,

    /// Secgroup ID or name
    #[arg(long)]
    pub secgroup: Option<String>,

    /// Admin secgroup ID or name
    #[arg(long)]
    pub admin_secgroup: Option<String>,

    /// Show servers of hypervisor
    #[arg(long, value_parser = HYPERVISORS)]
    pub hypervisor: Option<String>,

    /// Show servers in cloudregion
    #[arg(long)]
    pub region: Option<String>,

    /// Show servers with EIP
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub with_eip: Option<bool>,

    /// Show servers without EIP
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub without_eip: Option<bool>,

    /// OS type
    #[arg(long, value_parser = ["linux", "windows", "vmware"])]
    pub os_type: Option<String>,

    /// Vpc ID or name
    #[arg(long)]
    pub vpc: Vec<String>,

    /// Instance group ID or name
    #[arg(long)]
    pub group: Option<String>,

    /// Host SN
    #[arg(long)]
    pub host_sn: Option<String>,

    /// Filter by ip
    #[arg(long)]
    pub ip_addr: Option<String>,

    /// Order by disk size
    #[arg(long, value_parser = ["asc", "desc"])]
    pub order_by_disk: Option<String>,

    /// Order by host name
    #[arg(long, value_parser = ["asc", "desc"])]
    pub order_by_host: Option<String>,

    /// Resource type
    #[arg(long, value_parser = ["shared", "prepaid", "dedicated"])]
    pub resource_type: Option<String>,

    /// Billing type
    #[arg(long, value_parser = ["postpaid", "prepaid"])]
    pub billing_type: Option<String>,

    #[command(flatten)]
    #[serde(flatten)]
    pub base: BaseListOptions,
}

impl ListOptions for ServerListOptions {
    fn base(&self) -> &BaseListOptions {
        &self.base
    }
}

impl Options for ServerListOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        list_struct_to_params(self)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerIdOptions {
    /// ID or name of the server
    #[arg(value_name = "SERVER")]
    #[serde(skip)]
    pub id: String,
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerIdsOptions {
    /// IDs or names of the servers to operate
    #[arg(value_name = "SERVER", required = true, num_args = 1..)]
    #[serde(skip)]
    pub ids: Vec<String>,
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerShowOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub server: ServerIdOptions,

    /// With meta data
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub with_meta: Option<bool>,
}

impl Options for ServerShowOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        struct_to_params(self)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerStartOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub servers: ServerIdsOptions,

    /// Prefer qemu version
    #[arg(long)]
    pub qemu_version: Option<String>,
}

impl Options for ServerStartOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        struct_to_params(self)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerStopOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub servers: ServerIdsOptions,

    /// Stop server forcefully
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    #[serde(rename = "is_force")]
    pub force: Option<bool>,

    /// Stop charging when server stops
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub stop_charging: Option<bool>,
}

impl Options for ServerStopOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        struct_to_params(self)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerDeleteOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub servers: ServerIdsOptions,

    /// Delete server directly instead of pending delete
    #[arg(short = 'f', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub override_pending_delete: Option<bool>,

    /// Delete server snapshots
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub delete_snapshots: Option<bool>,

    /// Delete server disks
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub delete_disks: Option<bool>,

    /// Delete eip
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub delete_eip: Option<bool>,
}

impl Options for ServerDeleteOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        struct_to_params(self)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerUpdateOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub servers: ServerIdsOptions,

    /// New name to change
    #[arg(long)]
    pub name: Option<String>,

    /// Memory size
    #[arg(long)]
    #[serde(rename = "vmem_size")]
    pub vmem: Option<String>,

    /// CPU count
    #[arg(long)]
    #[serde(rename = "vcpu_count")]
    pub ncpu: Option<u32>,

    /// VGA driver
    #[arg(long, value_parser = ["std", "vmware", "cirrus", "qxl", "virtio"])]
    pub vga: Option<String>,

    /// VDI protocol
    #[arg(long, value_parser = ["vnc", "spice"])]
    pub vdi: Option<String>,

    /// BIOS
    #[arg(long, value_parser = ["BIOS", "UEFI"])]
    pub bios: Option<String>,

    /// Description
    #[arg(long)]
    #[serde(rename = "description")]
    pub desc: Option<String>,

    /// Boot device
    #[arg(long, value_parser = ["disk", "cdrom"])]
    #[serde(skip)]
    pub boot: Option<String>,

    /// Lock server to prevent from deleting
    #[arg(long, value_parser = ["enable", "disable"])]
    #[serde(skip)]
    pub delete: Option<String>,

    /// Behavior after VM server shutdown
    #[arg(long, value_parser = ["stop", "terminate"])]
    pub shutdown_behavior: Option<String>,

    /// Machine type
    #[arg(long, value_parser = ["q35", "pc"])]
    pub machine: Option<String>,

    /// Daemon server
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub is_daemon: Option<bool>,

    /// Host name of server
    #[arg(long)]
    pub hostname: Option<String>,
}

impl Options for ServerUpdateOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        let mut params = struct_to_params(self)?;

        match self.boot.as_deref() {
            Some("disk") => {
                params.insert("boot_order".into(), json!("cdn"));
            }
            Some(_) => {
                params.insert("boot_order".into(), json!("dcn"));
            }
            None => {}
        }
        match self.delete.as_deref() {
            Some("disable") => {
                params.insert("disable_delete".into(), json!(true));
            }
            Some(_) => {
                params.insert("disable_delete".into(), json!(false));
            }
            None => {}
        }

        if params.is_empty() {
            return Err(ParamsError::EmptyUpdate);
        }
        Ok(params)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeployAction {
    Create,
    Append,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub action: DeployAction,
    pub path: String,
    pub content: String,
}

/// Parse `[+]path:content`; the content may name a local file to read.
pub fn parse_deploy_info(info: &str) -> Result<DeployConfig, ParamsError> {
    let colon = match info.find(':') {
        Some(idx) if idx > 0 => idx,
        _ => return Err(ParamsError::MalformedDeployInfo(info.to_string())),
    };
    let (action, path) = match info.strip_prefix('+') {
        Some(rest) => (DeployAction::Append, &rest[..colon - 1]),
        None => (DeployAction::Create, &info[..colon]),
    };
    if path.trim().is_empty() {
        return Err(ParamsError::invalid("deploy", info, "empty target path"));
    }
    let name_or_content = &info[colon + 1..];
    let content = std::fs::read_to_string(name_or_content)
        .unwrap_or_else(|_| name_or_content.to_string());
    Ok(DeployConfig {
        action,
        path: path.to_string(),
        content,
    })
}

pub fn parse_deploy_info_list(list: &[String]) -> Result<Vec<DeployConfig>, ParamsError> {
    list.iter().map(|info| parse_deploy_info(info)).collect()
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerDeployOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub server: ServerIdOptions,

    /// SSH keypair used for login
    #[arg(long)]
    #[serde(skip)]
    pub keypair: Option<String>,

    /// Remove SSH keypairs
    #[arg(long)]
    #[serde(skip)]
    pub delete_keypair: bool,

    /// Deploy files into the server file system, [+]<path>:<content|file>
    #[arg(long)]
    #[serde(skip)]
    pub deploy: Vec<String>,

    /// Force reset password
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub reset_password: bool,

    /// Default user password
    #[arg(long)]
    pub password: Option<String>,

    /// Auto start server after deployed
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub auto_start: bool,
}

impl Options for ServerDeployOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        let mut params = struct_to_params(self)?;
        if self.delete_keypair {
            params.insert("delete_keypair".into(), json!(true));
        } else if let Some(keypair) = self.keypair.as_deref().filter(|k| !k.is_empty()) {
            params.insert("keypair".into(), json!(keypair));
        }
        let configs = parse_deploy_info_list(&self.deploy)?;
        if !configs.is_empty() {
            params.insert("deploy_configs".into(), serde_json::to_value(configs)?);
        }
        Ok(params)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerMetadataOptions {
    #[command(flatten)]
    #[serde(flatten)]
    pub server: ServerIdOptions,

    /// Tags info, e.g. hypervisor=aliyun os_type=Linux os_version
    #[arg(value_name = "TAGS")]
    #[serde(skip)]
    pub tags: Vec<String>,
}

impl Options for ServerMetadataOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        parse_metadata_tags(&self.tags)
    }
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerBatchMetadataOptions {
    /// IDs or names of servers
    #[arg(long = "guest")]
    #[serde(skip)]
    pub guests: Vec<String>,

    /// Tags info, e.g. hypervisor=aliyun os_type=Linux os_version
    #[arg(value_name = "TAGS")]
    #[serde(skip)]
    pub tags: Vec<String>,
}

impl Options for ServerBatchMetadataOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        if self.guests.is_empty() {
            return Err(ParamsError::Missing("guest"));
        }
        let mut params = Params::new();
        params.insert("guests".into(), json!(self.guests));
        params.insert("metadata".into(), Value::Object(parse_metadata_tags(&self.tags)?));
        Ok(params)
    }
}

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct DiskConfig {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

const FILESYSTEMS: [&str; 6] = ["ext2", "ext3", "ext4", "xfs", "ntfs", "swap"];
const DISK_DRIVERS: [&str; 5] = ["virtio", "ide", "scsi", "sata", "pvscsi"];
const DISK_MEDIUMS: [&str; 3] = ["ssd", "rotate", "hybrid"];

/// Parse a disk description such as `centos7,30g,ext4,/data`.
pub fn parse_disk_config(desc: &str, index: usize) -> Result<DiskConfig, ParamsError> {
    let mut disk = DiskConfig { index, ..Default::default() };
    for token in desc.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((key, value)) = token.split_once('=') {
            match key {
                "size" => disk.size = Some(parse_size_mb(value, 'm')?),
                "image" => disk.image_id = Some(value.to_string()),
                "backend" => disk.backend = Some(value.to_string()),
                "medium" => disk.medium = Some(value.to_string()),
                "driver" => disk.driver = Some(value.to_string()),
                "fs" => disk.fs = Some(value.to_string()),
                "mountpoint" => disk.mountpoint = Some(value.to_string()),
                "storage" => disk.storage = Some(value.to_string()),
                _ => return Err(ParamsError::invalid("disk", token, "unknown key")),
            }
            continue;
        }
        let lower = token.to_ascii_lowercase();
        if is_size(&lower) {
            disk.size = Some(parse_size_mb(&lower, 'm')?);
        } else if FILESYSTEMS.contains(&lower.as_str()) {
            disk.fs = Some(lower);
        } else if token.starts_with('/') {
            disk.mountpoint = Some(token.to_string());
        } else if DISK_DRIVERS.contains(&lower.as_str()) {
            disk.driver = Some(lower);
        } else if DISK_MEDIUMS.contains(&lower.as_str()) {
            disk.medium = Some(lower);
        } else if index == 0 {
            disk.image_id = Some(token.to_string());
        } else {
            return Err(ParamsError::invalid("disk", token, "image is only allowed on the system disk"));
        }
    }
    Ok(disk)
}

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bw_limit: Option<u32>,
}

const NIC_DRIVERS: [&str; 3] = ["virtio", "e1000", "vmxnet3"];

fn is_mac(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parse a network description such as `vnet1,192.168.0.10`.
pub fn parse_network_config(desc: &str, index: usize) -> Result<NetworkConfig, ParamsError> {
    let mut net = NetworkConfig { index, ..Default::default() };
    for token in desc.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((key, value)) = token.split_once('=') {
            match key {
                "network" => net.network = Some(value.to_string()),
                "address" => net.address = Some(value.to_string()),
                "mac" => net.mac = Some(value.to_string()),
                "driver" => net.driver = Some(value.to_string()),
                "bw_limit" => {
                    let bw = value
                        .parse()
                        .map_err(|_| ParamsError::invalid("bw_limit", value, "not a number"))?;
                    net.bw_limit = Some(bw);
                }
                _ => return Err(ParamsError::invalid("net", token, "unknown key")),
            }
            continue;
        }
        if token.parse::<Ipv4Addr>().is_ok() {
            net.address = Some(token.to_string());
        } else if is_mac(token) {
            net.mac = Some(token.to_ascii_lowercase());
        } else if NIC_DRIVERS.contains(&token) {
            net.driver = Some(token.to_string());
        } else {
            net.network = Some(token.to_string());
        }
    }
    Ok(net)
}

#[derive(Args, Serialize, Debug, Default)]
pub struct ServerCreateOptions {
    /// Name of the server
    #[arg(value_name = "NAME")]
    #[serde(skip)]
    pub name: String,

    /// Memory size, e.g. 2g
    #[arg(long)]
    #[serde(skip)]
    pub mem_spec: Option<String>,

    /// CPU count
    #[arg(long)]
    #[serde(rename = "vcpu_count")]
    pub ncpu: Option<u32>,

    /// Disk descriptions, e.g. centos7,30g
    #[arg(long)]
    #[serde(skip)]
    pub disk: Vec<String>,

    /// Network descriptions, e.g. vnet1,192.168.0.10
    #[arg(long)]
    #[serde(skip)]
    pub net: Vec<String>,

    /// Hypervisor type
    #[arg(long, value_parser = HYPERVISORS)]
    pub hypervisor: Option<String>,

    /// Preferred region where the server should be created
    #[arg(long)]
    #[serde(rename = "prefer_region")]
    pub region: Option<String>,

    /// Preferred zone where the server should be created
    #[arg(long)]
    #[serde(rename = "prefer_zone")]
    pub zone: Option<String>,

    /// Preferred host where the server should be created
    #[arg(long)]
    #[serde(rename = "prefer_host")]
    pub host: Option<String>,

    /// Create multiple simultaneously
    #[arg(long, default_value_t = 1)]
    pub count: u32,

    /// Treat NAME as a name pattern
    #[arg(long)]
    #[serde(skip)]
    pub generate_name: bool,

    /// Default user password
    #[arg(long)]
    pub password: Option<String>,

    /// SSH keypair
    #[arg(long)]
    pub keypair: Option<String>,

    /// Description
    #[arg(long)]
    #[serde(rename = "description")]
    pub desc: Option<String>,

    /// Auto start server after created
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub auto_start: bool,

    /// Deploy files into the server file system
    #[arg(long)]
    #[serde(skip)]
    pub deploy: Vec<String>,

    /// Metadata tags, e.g. os=linux
    #[arg(long)]
    #[serde(skip)]
    pub tag: Vec<String>,

    /// Owner project ID or name
    #[arg(long)]
    #[serde(rename = "tenant")]
    pub project: Option<String>,
}

impl Options for ServerCreateOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        let mut params = struct_to_params(self)?;

        if self.generate_name {
            params.insert("generate_name".into(), json!(self.name));
        } else {
            params.insert("name".into(), json!(self.name));
        }

        if let Some(mem) = self.mem_spec.as_deref() {
            params.insert("vmem_size".into(), json!(parse_size_mb(mem, 'm')?));
        }

        let disks = self
            .disk
            .iter()
            .enumerate()
            .map(|(i, d)| parse_disk_config(d, i))
            .collect::<Result<Vec<_>, _>>()?;
        if !disks.is_empty() {
            params.insert("disks".into(), serde_json::to_value(disks)?);
        }

        let nets = self
            .net
            .iter()
            .enumerate()
            .map(|(i, n)| parse_network_config(n, i))
            .collect::<Result<Vec<_>, _>>()?;
        if !nets.is_empty() {
            params.insert("nets".into(), serde_json::to_value(nets)?);
        }

        let configs = parse_deploy_info_list(&self.deploy)?;
        if !configs.is_empty() {
            params.insert("deploy_configs".into(), serde_json::to_value(configs)?);
        }

        let metadata = parse_metadata_tags(&self.tag)?;
        if !metadata.is_empty() {
            params.insert("metadata".into(), Value::Object(metadata));
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_maps_fields_and_base() {
        let opts = ServerListOptions {
            zone: Some("zone1".into()),
            gpu: Some(false),
            vpc: vec!["vpc1".into()],
            base: BaseListOptions {
                limit: 10,
                pending_delete: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let params = opts.params().unwrap();
        assert_eq!(
            Value::Object(params),
            json!({
                "zone": "zone1",
                "gpu": false,
                "vpc": ["vpc1"],
                "limit": 10,
                "pending_delete": true,
                "admin": true
            })
        );
    }

    #[test]
    fn stop_renames_force_and_skips_ids() {
        let opts = ServerStopOptions {
            servers: ServerIdsOptions { ids: vec!["vm1".into()] },
            force: Some(true),
            stop_charging: None,
        };
        let params = opts.params().unwrap();
        assert_eq!(Value::Object(params), json!({"is_force": true}));
    }

    #[test]
    fn update_boot_and_delete_flags() {
        let opts = ServerUpdateOptions {
            boot: Some("cdrom".into()),
            delete: Some("disable".into()),
            ncpu: Some(4),
            ..Default::default()
        };
        let params = opts.params().unwrap();
        assert_eq!(
            Value::Object(params),
            json!({"vcpu_count": 4, "boot_order": "dcn", "disable_delete": true})
        );

        let opts = ServerUpdateOptions { boot: Some("disk".into()), delete: Some("enable".into()), ..Default::default() };
        let params = opts.params().unwrap();
        assert_eq!(params["boot_order"], json!("cdn"));
        assert_eq!(params["disable_delete"], json!(false));
    }

    #[test]
    fn empty_update_is_rejected() {
        let opts = ServerUpdateOptions {
            servers: ServerIdsOptions { ids: vec!["vm1".into()] },
            ..Default::default()
        };
        assert!(matches!(opts.params(), Err(ParamsError::EmptyUpdate)));
    }

    #[test]
    fn deploy_info() {
        let cfg = parse_deploy_info("/etc/motd:hello").unwrap();
        assert_eq!(cfg.action, DeployAction::Create);
        assert_eq!(cfg.path, "/etc/motd");
        assert_eq!(cfg.content, "hello");

        let cfg = parse_deploy_info("+/etc/hosts:10.0.0.1 db").unwrap();
        assert_eq!(cfg.action, DeployAction::Append);
        assert_eq!(cfg.path, "/etc/hosts");
        assert_eq!(cfg.content, "10.0.0.1 db");

        assert!(matches!(parse_deploy_info(":x"), Err(ParamsError::MalformedDeployInfo(_))));
        assert!(matches!(parse_deploy_info("nocolon"), Err(ParamsError::MalformedDeployInfo(_))));
        assert!(matches!(parse_deploy_info("+:content"), Err(ParamsError::InvalidValue { .. })));
        assert!(matches!(parse_deploy_info(" :content"), Err(ParamsError::InvalidValue { .. })));
    }

    #[test]
    fn deploy_info_reads_local_file() {
        let path = std::env::temp_dir().join(format!("climc-deploy-{}", std::process::id()));
        std::fs::write(&path, "from file").unwrap();
        let cfg = parse_deploy_info(&format!("/root/a:{}", path.display())).unwrap();
        assert_eq!(cfg.content, "from file");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn deploy_delete_keypair_wins() {
        let opts = ServerDeployOptions {
            keypair: Some("kp1".into()),
            delete_keypair: true,
            auto_start: true,
            ..Default::default()
        };
        let params = opts.params().unwrap();
        assert_eq!(
            Value::Object(params),
            json!({"auto_start": true, "delete_keypair": true})
        );
    }

    #[test]
    fn batch_metadata_requires_guests() {
        let opts = ServerBatchMetadataOptions { guests: vec![], tags: vec!["a=b".into()] };
        assert!(matches!(opts.params(), Err(ParamsError::Missing("guest"))));

        let opts = ServerBatchMetadataOptions { guests: vec!["vm1".into()], tags: vec!["a=b".into()] };
        let params = opts.params().unwrap();
        assert_eq!(
            Value::Object(params),
            json!({"guests": ["vm1"], "metadata": {"a": "b"}})
        );
    }

    #[test]
    fn disk_grammar() {
        let disk = parse_disk_config("centos7,30g,ext4,/data,virtio", 0).unwrap();
        assert_eq!(disk.image_id.as_deref(), Some("centos7"));
        assert_eq!(disk.size, Some(30 * 1024));
        assert_eq!(disk.fs.as_deref(), Some("ext4"));
        assert_eq!(disk.mountpoint.as_deref(), Some("/data"));
        assert_eq!(disk.driver.as_deref(), Some("virtio"));

        let disk = parse_disk_config("size=512,medium=ssd", 1).unwrap();
        assert_eq!(disk.size, Some(512));
        assert_eq!(disk.medium.as_deref(), Some("ssd"));
        assert_eq!(disk.index, 1);

        assert!(parse_disk_config("centos7", 1).is_err());
        assert!(parse_disk_config("color=red", 0).is_err());
    }

    #[test]
    fn network_grammar() {
        let net = parse_network_config("vnet1,192.168.0.10,00:22:3E:aa:bb:cc,e1000", 0).unwrap();
        assert_eq!(net.network.as_deref(), Some("vnet1"));
        assert_eq!(net.address.as_deref(), Some("192.168.0.10"));
        assert_eq!(net.mac.as_deref(), Some("00:22:3e:aa:bb:cc"));
        assert_eq!(net.driver.as_deref(), Some("e1000"));

        assert!(parse_network_config("bw_limit=fast", 0).is_err());
    }

    #[test]
    fn create_assembles_params() {
        let opts = ServerCreateOptions {
            name: "web".into(),
            mem_spec: Some("2g".into()),
            ncpu: Some(2),
            disk: vec!["centos7,30g".into(), "100g".into()],
            net: vec!["vnet1".into()],
            zone: Some("zone1".into()),
            count: 1,
            generate_name: true,
            tag: vec!["env=prod".into()],
            ..Default::default()
        };
        let params = opts.params().unwrap();
        assert_eq!(
            Value::Object(params),
            json!({
                "vcpu_count": 2,
                "prefer_zone": "zone1",
                "count": 1,
                "generate_name": "web",
                "vmem_size": 2048,
                "disks": [
                    {"index": 0, "size": 30720, "image_id": "centos7"},
                    {"index": 1, "size": 102400}
                ],
                "nets": [{"index": 0, "network": "vnet1"}],
                "metadata": {"env": "prod"}
            })
        );
    }
}
