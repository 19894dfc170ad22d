//! RDS instances (`rds/v1 instances`)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::region::JdRegion;
use super::{parse_time, tags_to_map, Charge, Tag};
use crate::cloudprovider::status::*;
use crate::cloudprovider::{CloudDbInstance, CloudResource, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbInstanceDetail {
    pub instance_id: String,
    pub instance_name: String,
    pub instance_type: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    #[serde(rename = "instanceStorageGB")]
    pub instance_storage_gb: u32,
    pub instance_storage_type: String,
    #[serde(rename = "instanceCPU")]
    pub instance_cpu: u32,
    #[serde(rename = "instanceMemoryMB")]
    pub instance_memory_mb: u32,
    pub region_id: String,
    #[serde(rename = "azId")]
    pub az_id: Vec<String>,
    pub vpc_id: String,
    pub subnet_id: String,
    pub instance_status: String,
    pub public_domain_name: String,
    pub internal_domain_name: String,
    pub instance_port: String,
    pub create_time: String,
    pub charge: Charge,
    pub tags: Vec<Tag>,
}

fn db_status(status: &str) -> &'static str {
    match status {
        "BUILDING" => DBINSTANCE_DEPLOYING,
        "RUNNING" => DBINSTANCE_RUNNING,
        "DELETING" => DBINSTANCE_DELETING,
        "REBOOTING" | "RESTARTING" => DBINSTANCE_REBOOTING,
        "CLASS_CHANGING" | "MODIFYING" => DBINSTANCE_CHANGE_CONFIG,
        "RESTORING" => DBINSTANCE_RESTORING,
        "AZ_MIGRATING" | "MIGRATING" => DBINSTANCE_MIGRATING,
        _ => DBINSTANCE_UNKNOWN,
    }
}

#[derive(Clone)]
pub struct JdDbInstance {
    region: JdRegion,
    data: DbInstanceDetail,
}

impl JdRegion {
    pub async fn get_db_instances(&self) -> Result<Vec<JdDbInstance>> {
        let req = self.request("rds", "v1", "instances");
        let items: Vec<DbInstanceDetail> = self.client().list_all(&req, "dbInstances").await?;
        Ok(items
            .into_iter()
            .map(|data| JdDbInstance {
                region: self.clone(),
                data,
            })
            .collect())
    }

    pub async fn get_db_instance(&self, id: &str) -> Result<JdDbInstance> {
        let req = self.request("rds", "v1", &format!("instances/{}", id));
        let data = self.client().get(&req, "dbInstanceAttributes").await?;
        Ok(JdDbInstance {
            region: self.clone(),
            data,
        })
    }
}

#[async_trait]
impl CloudResource for JdDbInstance {
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
        db_status(&self.data.instance_status)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.data.create_time)
    }

    fn tags(&self) -> HashMap<String, String> {
        tags_to_map(&self.data.tags)
    }

    async fn refresh(&mut self) -> Result<()> {
        self.data = self.region.get_db_instance(&self.data.instance_id).await?.data;
        Ok(())
    }
}

#[async_trait]
impl CloudDbInstance for JdDbInstance {
    fn engine(&self) -> &str {
        &self.data.engine
    }

    fn engine_version(&self) -> &str {
        &self.data.engine_version
    }

    fn instance_class(&self) -> &str {
        &self.data.instance_class
    }

    fn vcpu_count(&self) -> u32 {
        self.data.instance_cpu
    }

    fn vmem_size_mb(&self) -> u32 {
        self.data.instance_memory_mb
    }

    fn disk_size_gb(&self) -> u32 {
        self.data.instance_storage_gb
    }

    fn storage_type(&self) -> &str {
        &self.data.instance_storage_type
    }

    fn zone_ids(&self) -> Vec<String> {
        self.data.az_id.clone()
    }

    fn vpc_id(&self) -> &str {
        &self.data.vpc_id
    }

    fn connection_str(&self) -> &str {
        &self.data.public_domain_name
    }

    fn internal_connection_str(&self) -> &str {
        &self.data.internal_domain_name
    }

    fn port(&self) -> u16 {
        self.data.instance_port.parse().unwrap_or(0)
    }

    fn billing_type(&self) -> &'static str {
        self.data.charge.billing_type()
    }
}
