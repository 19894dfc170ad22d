//! Disk snapshots (`disk/v1 snapshots`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::parse_time;
use super::region::JdRegion;
use crate::cloudprovider::status::*;
use crate::cloudprovider::{CloudResource, CloudSnapshot, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotDetail {
    pub snapshot_id: String,
    pub from_disk_id: String,
    #[serde(rename = "snapshotSizeGB")]
    pub snapshot_size_gb: i64,
    pub status: String,
    pub name: String,
    pub description: String,
    pub create_time: String,
}

fn snapshot_status(status: &str) -> &'static str {
    match status {
        "creating" => SNAPSHOT_CREATING,
        "available" | "in-use" => SNAPSHOT_READY,
        "deleting" => SNAPSHOT_DELETING,
        "error_create" => SNAPSHOT_FAILED,
        "error_delete" => SNAPSHOT_DELETE_FAILED,
        _ => SNAPSHOT_UNKNOWN,
    }
}

#[derive(Clone)]
pub struct JdSnapshot {
    region: JdRegion,
    data: SnapshotDetail,
}

impl JdRegion {
    pub async fn get_snapshots(&self) -> Result<Vec<JdSnapshot>> {
        let req = self.request("disk", "v1", "snapshots");
        let items: Vec<SnapshotDetail> = self.client().list_all(&req, "snapshots").await?;
        Ok(items
            .into_iter()
            .map(|data| JdSnapshot {
                region: self.clone(),
                data,
            })
            .collect())
    }

    pub async fn get_snapshot(&self, id: &str) -> Result<JdSnapshot> {
        let req = self.request("disk", "v1", &format!("snapshots/{}", id));
        let data = self.client().get(&req, "snapshot").await?;
        Ok(JdSnapshot {
            region: self.clone(),
            data,
        })
    }
}

#[async_trait]
impl CloudResource for JdSnapshot {
    fn id(&self) -> &str {
        &self.data.snapshot_id
    }

    fn name(&self) -> &str {
        &self.data.name
    }

    fn global_id(&self) -> String {
        self.data.snapshot_id.clone()
    }

    fn status(&self) -> &'static str {
        snapshot_status(&self.data.status)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.data.create_time)
    }

    fn description(&self) -> &str {
        &self.data.description
    }

    async fn refresh(&mut self) -> Result<()> {
        self.data = self.region.get_snapshot(&self.data.snapshot_id).await?.data;
        Ok(())
    }
}

#[async_trait]
impl CloudSnapshot for JdSnapshot {
    fn size_gb(&self) -> i64 {
        self.data.snapshot_size_gb
    }

    fn disk_id(&self) -> &str {
        &self.data.from_disk_id
    }

    // The snapshot API does not say which kind of disk it was taken from
    fn disk_type(&self) -> &'static str {
        DISK_TYPE_DATA
    }
}
