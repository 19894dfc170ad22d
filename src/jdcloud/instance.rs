//! Virtual machines (`vm/v1 instances`)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::disk::{AttachedDisk, DiskDetail, JdDisk};
use super::region::JdRegion;
use super::{filter_query, parse_time, tags_to_map, Charge, Tag};
use crate::cloudprovider::status::*;
use crate::cloudprovider::{
    CloudDisk, CloudEip, CloudNic, CloudResource, CloudVm, Result,
};

pub const HYPERVISOR: &str = "jdcloud";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceType {
    pub family: String,
    pub instance_type: String,
    pub cpu: u32,
    #[serde(rename = "memoryMB")]
    pub memory_mb: u32,
    pub desc: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalDisk {
    pub disk_type: String,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceDiskAttachment {
    pub disk_category: String,
    pub auto_delete: bool,
    pub device_name: String,
    pub status: String,
    pub local_disk: LocalDisk,
    pub cloud_disk: DiskDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityGroupSimple {
    pub group_id: String,
    pub group_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivateIp {
    pub private_ip_address: String,
    pub elastic_ip_id: String,
    pub elastic_ip_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterface {
    pub network_interface_id: String,
    pub mac_address: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub security_groups: Vec<SecurityGroupSimple>,
    pub primary_ip: PrivateIp,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterfaceAttachment {
    pub device_index: u32,
    pub auto_delete: bool,
    pub network_interface: NetworkInterface,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceDetail {
    pub instance_id: String,
    pub instance_name: String,
    pub hostname: String,
    pub instance_type: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub private_ip_address: String,
    pub elastic_ip_id: String,
    pub elastic_ip_address: String,
    pub status: String,
    pub description: String,
    pub image_id: String,
    pub os_type: String,
    pub system_disk: InstanceDiskAttachment,
    pub data_disks: Vec<InstanceDiskAttachment>,
    pub primary_network_interface: NetworkInterfaceAttachment,
    pub secondary_network_interfaces: Vec<NetworkInterfaceAttachment>,
    pub launch_time: String,
    pub az: String,
    pub key_names: Vec<String>,
    pub charge: Charge,
    pub tags: Vec<Tag>,
}

fn vm_status(status: &str) -> &'static str {
    match status {
        "pending" => VM_DEPLOYING,
        "starting" => VM_STARTING,
        "running" => VM_RUNNING,
        "stopping" => VM_STOPPING,
        "stopped" => VM_READY,
        "reboot" => VM_STARTING,
        "rebuild" => VM_REBUILD_ROOT,
        "resize" => VM_CHANGE_FLAVOR,
        "deleting" => VM_DELETING,
        _ => VM_UNKNOWN,
    }
}

#[derive(Clone)]
pub struct JdInstance {
    region: JdRegion,
    data: InstanceDetail,
    spec: InstanceType,
}

impl JdInstance {
    fn new(region: JdRegion, data: InstanceDetail, types: &HashMap<String, InstanceType>) -> Self {
        let spec = types.get(&data.instance_type).cloned().unwrap_or_default();
        Self { region, data, spec }
    }

    pub fn detail(&self) -> &InstanceDetail {
        &self.data
    }

    /// Cloud disks attached to this instance, system disk first
    pub(crate) fn attached_disks(&self) -> Vec<AttachedDisk> {
        let system_id = &self.data.system_disk.cloud_disk.disk_id;
        std::iter::once(&self.data.system_disk)
            .chain(self.data.data_disks.iter())
            .filter(|a| !a.cloud_disk.disk_id.is_empty())
            .map(|a| {
                let is_system = &a.cloud_disk.disk_id == system_id;
                AttachedDisk {
                    disk_id: a.cloud_disk.disk_id.clone(),
                    is_system,
                    auto_delete: a.auto_delete,
                    template_id: if is_system {
                        self.data.image_id.clone()
                    } else {
                        String::new()
                    },
                }
            })
            .collect()
    }
}

impl JdRegion {
    pub async fn get_instance_types(&self) -> Result<HashMap<String, InstanceType>> {
        let req = self.request("vm", "v1", "instanceTypes");
        let mut result = self.client().request(&req).await?;
        let types: Vec<InstanceType> = match result.get_mut("instanceTypes").map(serde_json::Value::take) {
            Some(value) if !value.is_null() => serde_json::from_value(value)?,
            _ => Vec::new(),
        };
        Ok(types
            .into_iter()
            .map(|t| (t.instance_type.clone(), t))
            .collect())
    }

    /// List instances, optionally restricted to a zone and/or a set of ids
    pub async fn get_instances(&self, zone_id: Option<&str>, ids: &[String]) -> Result<Vec<JdInstance>> {
        let zone: Vec<String> = zone_id.map(|z| vec![z.to_string()]).unwrap_or_default();
        let req = self
            .request("vm", "v1", "instances")
            .with_query(filter_query(&[("instanceId", ids), ("az", &zone)]));
        let items: Vec<InstanceDetail> = self.client().list_all(&req, "instances").await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let types = self.get_instance_types().await?;
        Ok(items
            .into_iter()
            .map(|data| JdInstance::new(self.clone(), data, &types))
            .collect())
    }

    pub async fn get_instance(&self, id: &str) -> Result<JdInstance> {
        let req = self.request("vm", "v1", &format!("instances/{}", id));
        let data: InstanceDetail = self.client().get(&req, "instance").await?;
        let types = self.get_instance_types().await?;
        Ok(JdInstance::new(self.clone(), data, &types))
    }
}

#[async_trait]
impl CloudResource for JdInstance {
    fn id(&self) -> &str {
        &self.data.instance_id
    }

    fn name(&self) -> &str {
        &self.data.instance_name
    }

    fn global_id(&self) -> String {
        self.data.instance_id.clone()
    }

    fn status(&self) -> &'static str {
        vm_status(&self.data.status)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.data.launch_time)
    }

    fn description(&self) -> &str {
        &self.data.description
    }

    fn tags(&self) -> HashMap<String, String> {
        tags_to_map(&self.data.tags)
    }

    async fn refresh(&mut self) -> Result<()> {
        let fresh = self.region.get_instance(&self.data.instance_id).await?;
        self.data = fresh.data;
        self.spec = fresh.spec;
        Ok(())
    }
}

#[async_trait]
impl CloudVm for JdInstance {
    fn hostname(&self) -> &str {
        &self.data.hostname
    }

    fn host_id(&self) -> String {
        format!("{}-{}", self.region.client().access_key_id(), self.data.az)
    }

    fn zone_id(&self) -> &str {
        &self.data.az
    }

    fn instance_type(&self) -> &str {
        &self.data.instance_type
    }

    fn vcpu_count(&self) -> u32 {
        self.spec.cpu
    }

    fn vmem_size_mb(&self) -> u32 {
        self.spec.memory_mb
    }

    fn os_type(&self) -> &str {
        &self.data.os_type
    }

    fn hypervisor(&self) -> &'static str {
        HYPERVISOR
    }

    fn billing_type(&self) -> &'static str {
        self.data.charge.billing_type()
    }

    fn expired_at(&self) -> Option<DateTime<Utc>> {
        self.data.charge.expired_at()
    }

    fn security_group_ids(&self) -> Vec<String> {
        self.data
            .primary_network_interface
            .network_interface
            .security_groups
            .iter()
            .map(|g| g.group_id.clone())
            .collect()
    }

    fn nics(&self) -> Vec<CloudNic> {
        std::iter::once(&self.data.primary_network_interface)
            .chain(self.data.secondary_network_interfaces.iter())
            .map(|a| &a.network_interface)
            .filter(|nic| !nic.network_interface_id.is_empty())
            .map(|nic| CloudNic {
                id: nic.network_interface_id.clone(),
                ip: nic.primary_ip.private_ip_address.clone(),
                mac: nic.mac_address.clone(),
                network_id: nic.subnet_id.clone(),
                driver: "virtio".into(),
            })
            .collect()
    }

    fn eip(&self) -> Option<CloudEip> {
        if self.data.elastic_ip_id.is_empty() {
            return None;
        }
        Some(CloudEip {
            id: self.data.elastic_ip_id.clone(),
            ip_addr: self.data.elastic_ip_address.clone(),
        })
    }

    async fn disks(&self) -> Result<Vec<Box<dyn CloudDisk>>> {
        let attached: HashMap<String, AttachedDisk> = self
            .attached_disks()
            .into_iter()
            .map(|a| (a.disk_id.clone(), a))
            .collect();
        if attached.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = attached.keys().cloned().collect();
        let mut disks: Vec<JdDisk> = self
            .region
            .get_disks(&ids)
            .await?
            .into_iter()
            .map(|disk| match attached.get(disk.id()) {
                Some(a) => disk.attached(a),
                None => disk,
            })
            .collect();
        disks.sort_by_key(|d| d.disk_type() != DISK_TYPE_SYS);

        Ok(disks
            .into_iter()
            .map(|d| Box::new(d) as Box<dyn CloudDisk>)
            .collect())
    }
}
