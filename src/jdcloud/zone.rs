//! Availability zones

use async_trait::async_trait;

use super::host::JdHost;
use super::region::JdRegion;
use crate::cloudprovider::status::ZONE_ENABLE;
use crate::cloudprovider::{CloudHost, CloudResource, CloudZone, Result};

/// Availability zone from the static catalog
#[derive(Clone)]
pub struct JdZone {
    region: JdRegion,
    id: &'static str,
}

impl JdZone {
    pub fn new(region: JdRegion, id: &'static str) -> Self {
        Self { region, id }
    }

    pub fn region(&self) -> &JdRegion {
        &self.region
    }

    /// The single emulated host standing for this zone
    pub fn host(&self) -> JdHost {
        JdHost::new(self.clone())
    }
}

#[async_trait]
impl CloudResource for JdZone {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.id
    }

    fn global_id(&self) -> String {
        format!("{}/{}", self.region.global_id(), self.id)
    }

    fn status(&self) -> &'static str {
        ZONE_ENABLE
    }
}

#[async_trait]
impl CloudZone for JdZone {
    fn region_id(&self) -> &str {
        self.region.id()
    }

    async fn hosts(&self) -> Result<Vec<Box<dyn CloudHost>>> {
        Ok(vec![Box::new(self.host()) as Box<dyn CloudHost>])
    }
}
