//! One emulated host per zone

use async_trait::async_trait;

use super::zone::JdZone;
use super::PROVIDER;
use crate::cloudprovider::status::HOST_ONLINE;
use crate::cloudprovider::{CloudHost, CloudResource, CloudVm, Result};

pub const HOST_TYPE: &str = "jdcloud";

/// Emulated host: one per account and zone
#[derive(Clone)]
pub struct JdHost {
    zone: JdZone,
    id: String,
    name: String,
}

impl JdHost {
    pub fn new(zone: JdZone) -> Self {
        let zone_id = zone.id().to_string();
        let id = format!("{}-{}", zone.region().client().access_key_id(), zone_id);
        let name = format!("{}-{}", PROVIDER, zone_id);
        Self { zone, id, name }
    }
}

#[async_trait]
impl CloudResource for JdHost {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn global_id(&self) -> String {
        self.id.clone()
    }

    fn status(&self) -> &'static str {
        HOST_ONLINE
    }

    fn is_emulated(&self) -> bool {
        true
    }
}

#[async_trait]
impl CloudHost for JdHost {
    fn zone_id(&self) -> &str {
        self.zone.id()
    }

    fn host_status(&self) -> &'static str {
        HOST_ONLINE
    }

    fn host_type(&self) -> &'static str {
        HOST_TYPE
    }

    async fn vms(&self) -> Result<Vec<Box<dyn CloudVm>>> {
        Ok(self
            .zone
            .region()
            .get_instances(Some(self.zone.id()), &[])
            .await?
            .into_iter()
            .map(|vm| Box::new(vm) as Box<dyn CloudVm>)
            .collect())
    }
}
