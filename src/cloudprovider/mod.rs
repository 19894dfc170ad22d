//! Provider-neutral cloud resource interface
//!
//! Each provider adapter wraps its own wire types and exposes them through
//! these traits. Mutations default to [`CloudError::NotImplemented`] so an
//! adapter only overrides what its provider actually supports.

pub mod status;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("{0}: not implemented")]
    NotImplemented(&'static str),

    #[error("{0}: not supported")]
    NotSupported(&'static str),

    #[error("{0} not found")]
    NotFound(String),

    #[error("api error [{code}][{status}] {message} (request id {request_id})")]
    Api {
        code: i64,
        status: String,
        message: String,
        request_id: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CloudError>;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GeographicInfo {
    pub latitude: f32,
    pub longitude: f32,
    pub city: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CloudNic {
    pub id: String,
    pub ip: String,
    pub mac: String,
    pub network_id: String,
    pub driver: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CloudEip {
    pub id: String,
    pub ip_addr: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleProtocol {
    Any,
    Tcp,
    Udp,
    Icmp,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SecurityRule {
    pub id: String,
    pub direction: RuleDirection,
    pub protocol: RuleProtocol,
    pub cidr: String,
    /// Empty means all ports
    pub ports: String,
    pub action: RuleAction,
    pub priority: u32,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct VpcCreateOptions {
    pub name: String,
    pub cidr: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct SecurityGroupCreateOptions {
    pub name: String,
    pub vpc_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct VmCreateConfig {
    pub name: String,
    pub hostname: String,
    pub image_id: String,
    pub instance_type: String,
    pub network_id: String,
    pub sys_disk_size_gb: u32,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct VmChangeConfig {
    pub instance_type: String,
    pub cpu: u32,
    pub memory_mb: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RebuildRootConfig {
    pub image_id: String,
    pub password: String,
    pub keypair: String,
}

/// Common accessors of every cloud resource
#[async_trait]
pub trait CloudResource: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn global_id(&self) -> String;
    fn status(&self) -> &'static str;

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn description(&self) -> &str {
        ""
    }

    fn tags(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn is_emulated(&self) -> bool {
        false
    }

    /// Re-read the resource from the provider
    async fn refresh(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait CloudRegion: CloudResource {
    fn provider(&self) -> &'static str;
    fn geographic_info(&self) -> GeographicInfo;

    async fn zones(&self) -> Result<Vec<Box<dyn CloudZone>>>;
    async fn vpcs(&self) -> Result<Vec<Box<dyn CloudVpc>>>;
    async fn vms(&self) -> Result<Vec<Box<dyn CloudVm>>>;
    async fn vm_by_id(&self, id: &str) -> Result<Box<dyn CloudVm>>;
    async fn disks(&self) -> Result<Vec<Box<dyn CloudDisk>>>;
    async fn disk_by_id(&self, id: &str) -> Result<Box<dyn CloudDisk>>;
    async fn security_groups(&self) -> Result<Vec<Box<dyn CloudSecurityGroup>>>;
    async fn security_group_by_id(&self, id: &str) -> Result<Box<dyn CloudSecurityGroup>>;
    async fn snapshots(&self) -> Result<Vec<Box<dyn CloudSnapshot>>>;
    async fn snapshot_by_id(&self, id: &str) -> Result<Box<dyn CloudSnapshot>>;
    async fn db_instances(&self) -> Result<Vec<Box<dyn CloudDbInstance>>>;
    async fn db_instance_by_id(&self, id: &str) -> Result<Box<dyn CloudDbInstance>>;

    async fn zone_by_id(&self, id: &str) -> Result<Box<dyn CloudZone>> {
        self.zones()
            .await?
            .into_iter()
            .find(|z| z.id() == id || z.global_id() == id)
            .ok_or_else(|| CloudError::NotFound(format!("zone {}", id)))
    }

    async fn vpc_by_id(&self, id: &str) -> Result<Box<dyn CloudVpc>> {
        self.vpcs()
            .await?
            .into_iter()
            .find(|v| v.id() == id)
            .ok_or_else(|| CloudError::NotFound(format!("vpc {}", id)))
    }

    async fn hosts(&self) -> Result<Vec<Box<dyn CloudHost>>> {
        let mut hosts = Vec::new();
        for zone in self.zones().await? {
            hosts.extend(zone.hosts().await?);
        }
        Ok(hosts)
    }

    async fn host_by_id(&self, id: &str) -> Result<Box<dyn CloudHost>> {
        self.hosts()
            .await?
            .into_iter()
            .find(|h| h.id() == id || h.global_id() == id)
            .ok_or_else(|| CloudError::NotFound(format!("host {}", id)))
    }

    async fn create_vpc(&self, _opts: &VpcCreateOptions) -> Result<Box<dyn CloudVpc>> {
        Err(CloudError::NotImplemented("create_vpc"))
    }

    async fn create_security_group(
        &self,
        _opts: &SecurityGroupCreateOptions,
    ) -> Result<Box<dyn CloudSecurityGroup>> {
        Err(CloudError::NotImplemented("create_security_group"))
    }
}

#[async_trait]
pub trait CloudZone: CloudResource {
    fn region_id(&self) -> &str;

    async fn hosts(&self) -> Result<Vec<Box<dyn CloudHost>>>;

    async fn host_by_id(&self, id: &str) -> Result<Box<dyn CloudHost>> {
        self.hosts()
            .await?
            .into_iter()
            .find(|h| h.id() == id)
            .ok_or_else(|| CloudError::NotFound(format!("host {}", id)))
    }
}

#[async_trait]
pub trait CloudHost: CloudResource {
    fn zone_id(&self) -> &str;
    fn host_status(&self) -> &'static str;
    fn host_type(&self) -> &'static str;

    async fn vms(&self) -> Result<Vec<Box<dyn CloudVm>>>;

    async fn vm_by_id(&self, id: &str) -> Result<Box<dyn CloudVm>> {
        self.vms()
            .await?
            .into_iter()
            .find(|vm| vm.id() == id)
            .ok_or_else(|| CloudError::NotFound(format!("vm {}", id)))
    }

    async fn create_vm(&self, _config: &VmCreateConfig) -> Result<Box<dyn CloudVm>> {
        Err(CloudError::NotImplemented("create_vm"))
    }
}

#[async_trait]
pub trait CloudVm: CloudResource {
    fn hostname(&self) -> &str;
    fn host_id(&self) -> String;
    fn zone_id(&self) -> &str;
    fn instance_type(&self) -> &str;
    fn vcpu_count(&self) -> u32;
    fn vmem_size_mb(&self) -> u32;
    fn os_type(&self) -> &str;
    fn hypervisor(&self) -> &'static str;
    fn billing_type(&self) -> &'static str;
    fn expired_at(&self) -> Option<DateTime<Utc>>;
    fn security_group_ids(&self) -> Vec<String>;
    fn nics(&self) -> Vec<CloudNic>;
    fn eip(&self) -> Option<CloudEip>;

    async fn disks(&self) -> Result<Vec<Box<dyn CloudDisk>>>;

    async fn start(&self) -> Result<()> {
        Err(CloudError::NotImplemented("start_vm"))
    }

    async fn stop(&self, _force: bool) -> Result<()> {
        Err(CloudError::NotImplemented("stop_vm"))
    }

    async fn delete(&self) -> Result<()> {
        Err(CloudError::NotImplemented("delete_vm"))
    }

    async fn change_config(&self, _config: &VmChangeConfig) -> Result<()> {
        Err(CloudError::NotImplemented("change_config"))
    }

    async fn rebuild_root(&self, _config: &RebuildRootConfig) -> Result<String> {
        Err(CloudError::NotImplemented("rebuild_root"))
    }

    async fn attach_disk(&self, _disk_id: &str) -> Result<()> {
        Err(CloudError::NotImplemented("attach_disk"))
    }

    async fn detach_disk(&self, _disk_id: &str) -> Result<()> {
        Err(CloudError::NotImplemented("detach_disk"))
    }

    async fn set_security_groups(&self, _ids: &[String]) -> Result<()> {
        Err(CloudError::NotImplemented("set_security_groups"))
    }
}

#[async_trait]
pub trait CloudDisk: CloudResource {
    fn size_mb(&self) -> i64;
    /// `sys` or `data`
    fn disk_type(&self) -> &'static str;
    /// Provider storage type, e.g. ssd.gp1
    fn storage_type(&self) -> &str;
    fn zone_id(&self) -> &str;
    fn is_auto_delete(&self) -> bool;
    fn template_id(&self) -> &str;
    fn mount_instance_ids(&self) -> Vec<String>;

    async fn delete(&self) -> Result<()> {
        Err(CloudError::NotImplemented("delete_disk"))
    }

    async fn resize(&self, _size_mb: i64) -> Result<()> {
        Err(CloudError::NotImplemented("resize_disk"))
    }

    async fn create_snapshot(&self, _name: &str, _desc: &str) -> Result<Box<dyn CloudSnapshot>> {
        Err(CloudError::NotImplemented("create_snapshot"))
    }

    async fn reset(&self, _snapshot_id: &str) -> Result<String> {
        Err(CloudError::NotImplemented("reset_disk"))
    }
}

#[async_trait]
pub trait CloudVpc: CloudResource {
    fn region_id(&self) -> &str;
    fn cidr_block(&self) -> &str;
    fn is_default(&self) -> bool;

    async fn networks(&self) -> Result<Vec<Box<dyn CloudNetwork>>>;
    async fn security_groups(&self) -> Result<Vec<Box<dyn CloudSecurityGroup>>>;

    async fn delete(&self) -> Result<()> {
        Err(CloudError::NotImplemented("delete_vpc"))
    }
}

#[async_trait]
pub trait CloudNetwork: CloudResource {
    fn vpc_id(&self) -> &str;
    fn ip_start(&self) -> String;
    fn ip_end(&self) -> String;
    fn ip_mask(&self) -> u8;
    fn gateway(&self) -> String;
    fn server_type(&self) -> &'static str {
        "guest"
    }

    async fn delete(&self) -> Result<()> {
        Err(CloudError::NotImplemented("delete_network"))
    }
}

#[async_trait]
pub trait CloudSecurityGroup: CloudResource {
    fn vpc_id(&self) -> &str;
    fn rules(&self) -> Vec<SecurityRule>;

    async fn delete(&self) -> Result<()> {
        Err(CloudError::NotImplemented("delete_security_group"))
    }
}

#[async_trait]
pub trait CloudSnapshot: CloudResource {
    fn size_gb(&self) -> i64;
    fn disk_id(&self) -> &str;
    fn disk_type(&self) -> &'static str;

    async fn delete(&self) -> Result<()> {
        Err(CloudError::NotImplemented("delete_snapshot"))
    }
}

#[async_trait]
pub trait CloudDbInstance: CloudResource {
    fn engine(&self) -> &str;
    fn engine_version(&self) -> &str;
    fn instance_class(&self) -> &str;
    fn vcpu_count(&self) -> u32;
    fn vmem_size_mb(&self) -> u32;
    fn disk_size_gb(&self) -> u32;
    fn storage_type(&self) -> &str;
    fn zone_ids(&self) -> Vec<String>;
    fn vpc_id(&self) -> &str;
    fn connection_str(&self) -> &str;
    fn internal_connection_str(&self) -> &str;
    fn port(&self) -> u16;
    fn billing_type(&self) -> &'static str;

    async fn reboot(&self) -> Result<()> {
        Err(CloudError::NotImplemented("reboot_dbinstance"))
    }

    async fn delete(&self) -> Result<()> {
        Err(CloudError::NotImplemented("delete_dbinstance"))
    }
}
