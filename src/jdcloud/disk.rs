//! Cloud disks (`disk/v1 disks`)

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::region::JdRegion;
use super::{filter_query, parse_time, tags_to_map, Charge, Tag};
use crate::cloudprovider::status::*;
use crate::cloudprovider::{CloudDisk, CloudResource, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskAttachment {
    pub attachment_id: String,
    pub disk_id: String,
    pub instance_type: String,
    pub instance_id: String,
    pub status: String,
    pub attach_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskDetail {
    pub disk_id: String,
    pub az: String,
    pub name: String,
    pub description: String,
    pub disk_type: String,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: i64,
    pub iops: i64,
    pub throughput: i64,
    pub status: String,
    pub attachments: Vec<DiskAttachment>,
    pub snapshot_id: String,
    pub multi_attachable: bool,
    pub encrypted: bool,
    pub create_time: String,
    pub charge: Charge,
    pub tags: Vec<Tag>,
}

fn disk_status(status: &str) -> &'static str {
    match status {
        "creating" => DISK_ALLOCATING,
        "available" | "in-use" => DISK_READY,
        "extending" => DISK_RESIZING,
        "restoring" => DISK_RESET,
        "deleting" => DISK_DEALLOC,
        "error_create" => DISK_ALLOC_FAILED,
        "error_delete" => DISK_DEALLOC_FAILED,
        "error_restore" => DISK_RESET_FAILED,
        "error_extend" => DISK_RESIZE_FAILED,
        _ => DISK_UNKNOWN,
    }
}

/// What an instance knows about one of its attached disks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDisk {
    pub disk_id: String,
    pub is_system: bool,
    pub auto_delete: bool,
    pub template_id: String,
}

/// A disk; system flag, auto-delete and template only known through an instance
#[derive(Clone)]
pub struct JdDisk {
    region: JdRegion,
    data: DiskDetail,
    is_system: bool,
    auto_delete: bool,
    template_id: String,
}

impl JdDisk {
    fn new(region: JdRegion, data: DiskDetail) -> Self {
        Self {
            region,
            data,
            is_system: false,
            auto_delete: false,
            template_id: String::new(),
        }
    }

    /// Annotate with what the owning instance knows about the attachment
    pub fn attached(mut self, attachment: &AttachedDisk) -> Self {
        self.is_system = attachment.is_system;
        self.auto_delete = attachment.auto_delete;
        self.template_id = attachment.template_id.clone();
        self
    }

    pub fn detail(&self) -> &DiskDetail {
        &self.data
    }
}

impl JdRegion {
    /// All disks, or only those in `ids` when non-empty
    pub async fn get_disks(&self, ids: &[String]) -> Result<Vec<JdDisk>> {
        let req = self
            .request("disk", "v1", "disks")
            .with_query(filter_query(&[("diskId", ids)]));
        let items: Vec<DiskDetail> = self.client().list_all(&req, "disks").await?;
        Ok(items
            .into_iter()
            .map(|data| JdDisk::new(self.clone(), data))
            .collect())
    }

    /// Every disk of the region, attached or not, annotated from the
    /// instances that carry it
    pub async fn get_region_disks(&self) -> Result<Vec<JdDisk>> {
        let mut attached = HashMap::new();
        for vm in self.get_instances(None, &[]).await? {
            for a in vm.attached_disks() {
                attached.insert(a.disk_id.clone(), a);
            }
        }

        let mut seen = HashSet::new();
        Ok(self
            .get_disks(&[])
            .await?
            .into_iter()
            .filter(|disk| seen.insert(disk.data.disk_id.clone()))
            .map(|disk| match attached.get(&disk.data.disk_id) {
                Some(a) => disk.attached(a),
                None => disk,
            })
            .collect())
    }

    pub async fn get_disk(&self, id: &str) -> Result<JdDisk> {
        let req = self.request("disk", "v1", &format!("disks/{}", id));
        let data: DiskDetail = self.client().get(&req, "disk").await?;
        Ok(JdDisk::new(self.clone(), data))
    }
}

#[async_trait]
impl CloudResource for JdDisk {
    fn id(&self) -> &str {
        &self.data.disk_id
    }

    fn name(&self) -> &str {
        &self.data.name
    }

    fn global_id(&self) -> String {
        self.data.disk_id.clone()
    }

    fn status(&self) -> &'static str {
        disk_status(&self.data.status)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.data.create_time)
    }

    fn description(&self) -> &str {
        &self.data.description
    }

    fn tags(&self) -> HashMap<String, String> {
        tags_to_map(&self.data.tags)
    }

    async fn refresh(&mut self) -> Result<()> {
        self.data = self.region.get_disk(&self.data.disk_id).await?.data;
        Ok(())
    }
}

#[async_trait]
impl CloudDisk for JdDisk {
    fn size_mb(&self) -> i64 {
        self.data.disk_size_gb * 1024
    }

    fn disk_type(&self) -> &'static str {
        if self.is_system {
            DISK_TYPE_SYS
        } else {
            DISK_TYPE_DATA
        }
    }

    fn storage_type(&self) -> &str {
        &self.data.disk_type
    }

    fn zone_id(&self) -> &str {
        &self.data.az
    }

    fn is_auto_delete(&self) -> bool {
        self.auto_delete
    }

    fn template_id(&self) -> &str {
        &self.template_id
    }

    fn mount_instance_ids(&self) -> Vec<String> {
        self.data
            .attachments
            .iter()
            .filter(|a| !a.instance_id.is_empty())
            .map(|a| a.instance_id.clone())
            .collect()
    }
}
