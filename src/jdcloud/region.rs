//! Regions from the static catalog

use std::sync::Arc;

use async_trait::async_trait;

use super::transport::ApiRequest;
use super::zone::JdZone;
use super::{JdCloudClient, RegionInfo, PROVIDER};
use crate::cloudprovider::status::REGION_INSERVICE;
use crate::cloudprovider::{
    CloudDbInstance, CloudDisk, CloudRegion, CloudResource, CloudSecurityGroup, CloudSnapshot,
    CloudVm, CloudVpc, CloudZone, GeographicInfo, Result,
};

#[derive(Clone)]
pub struct JdRegion {
    client: Arc<JdCloudClient>,
    info: &'static RegionInfo,
}

impl JdRegion {
    pub fn new(client: Arc<JdCloudClient>, info: &'static RegionInfo) -> Self {
        Self { client, info }
    }

    pub fn client(&self) -> &JdCloudClient {
        &self.client
    }

    /// GET request against this region
    pub(crate) fn request(&self, service: &'static str, version: &'static str, path: &str) -> ApiRequest {
        ApiRequest::get(service, version, self.info.id, path)
    }

    pub fn get_zones(&self) -> Vec<JdZone> {
        self.info
            .zones
            .iter()
            .map(|id| JdZone::new(self.clone(), *id))
            .collect()
    }
}

#[async_trait]
impl CloudResource for JdRegion {
    fn id(&self) -> &str {
        self.info.id
    }

    fn name(&self) -> &str {
        self.info.name
    }

    fn global_id(&self) -> String {
        format!("{}/{}", PROVIDER, self.info.id)
    }

    fn status(&self) -> &'static str {
        REGION_INSERVICE
    }
}

#[async_trait]
impl CloudRegion for JdRegion {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn geographic_info(&self) -> GeographicInfo {
        GeographicInfo {
            latitude: self.info.latitude,
            longitude: self.info.longitude,
            city: self.info.city.to_string(),
            country_code: "CN".into(),
        }
    }

    async fn zones(&self) -> Result<Vec<Box<dyn CloudZone>>> {
        Ok(self
            .get_zones()
            .into_iter()
            .map(|z| Box::new(z) as Box<dyn CloudZone>)
            .collect())
    }

    async fn vpcs(&self) -> Result<Vec<Box<dyn CloudVpc>>> {
        Ok(self
            .get_vpcs()
            .await?
            .into_iter()
            .map(|v| Box::new(v) as Box<dyn CloudVpc>)
            .collect())
    }

    async fn vpc_by_id(&self, id: &str) -> Result<Box<dyn CloudVpc>> {
        Ok(Box::new(self.get_vpc(id).await?) as Box<dyn CloudVpc>)
    }

    async fn vms(&self) -> Result<Vec<Box<dyn CloudVm>>> {
        Ok(self
            .get_instances(None, &[])
            .await?
            .into_iter()
            .map(|vm| Box::new(vm) as Box<dyn CloudVm>)
            .collect())
    }

    async fn vm_by_id(&self, id: &str) -> Result<Box<dyn CloudVm>> {
        Ok(Box::new(self.get_instance(id).await?) as Box<dyn CloudVm>)
    }

    async fn disks(&self) -> Result<Vec<Box<dyn CloudDisk>>> {
        Ok(self
            .get_region_disks()
            .await?
            .into_iter()
            .map(|d| Box::new(d) as Box<dyn CloudDisk>)
            .collect())
    }

    async fn disk_by_id(&self, id: &str) -> Result<Box<dyn CloudDisk>> {
        Ok(Box::new(self.get_disk(id).await?) as Box<dyn CloudDisk>)
    }

    async fn security_groups(&self) -> Result<Vec<Box<dyn CloudSecurityGroup>>> {
        Ok(self
            .get_security_groups(None)
            .await?
            .into_iter()
            .map(|g| Box::new(g) as Box<dyn CloudSecurityGroup>)
            .collect())
    }

    async fn security_group_by_id(&self, id: &str) -> Result<Box<dyn CloudSecurityGroup>> {
        Ok(Box::new(self.get_security_group(id).await?) as Box<dyn CloudSecurityGroup>)
    }

    async fn snapshots(&self) -> Result<Vec<Box<dyn CloudSnapshot>>> {
        Ok(self
            .get_snapshots()
            .await?
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn CloudSnapshot>)
            .collect())
    }

    async fn snapshot_by_id(&self, id: &str) -> Result<Box<dyn CloudSnapshot>> {
        Ok(Box::new(self.get_snapshot(id).await?) as Box<dyn CloudSnapshot>)
    }

    async fn db_instances(&self) -> Result<Vec<Box<dyn CloudDbInstance>>> {
        Ok(self
            .get_db_instances()
            .await?
            .into_iter()
            .map(|d| Box::new(d) as Box<dyn CloudDbInstance>)
            .collect())
    }

    async fn db_instance_by_id(&self, id: &str) -> Result<Box<dyn CloudDbInstance>> {
        Ok(Box::new(self.get_db_instance(id).await?) as Box<dyn CloudDbInstance>)
    }
}
