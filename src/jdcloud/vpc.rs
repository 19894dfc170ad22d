//! VPCs (`vpc/v1 vpcs`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::parse_time;
use super::region::JdRegion;
use crate::cloudprovider::status::VPC_AVAILABLE;
use crate::cloudprovider::{
    CloudNetwork, CloudResource, CloudSecurityGroup, CloudVpc, Result,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VpcDetail {
    pub vpc_id: String,
    pub vpc_name: String,
    pub address_prefix: String,
    pub description: String,
    pub acl_ids: Vec<String>,
    pub created_time: String,
}

#[derive(Clone)]
pub struct JdVpc {
    region: JdRegion,
    data: VpcDetail,
}

impl JdRegion {
    pub async fn get_vpcs(&self) -> Result<Vec<JdVpc>> {
        let req = self.request("vpc", "v1", "vpcs");
        let items: Vec<VpcDetail> = self.client().list_all(&req, "vpcs").await?;
        Ok(items
            .into_iter()
            .map(|data| JdVpc {
                region: self.clone(),
                data,
            })
            .collect())
    }

    pub async fn get_vpc(&self, id: &str) -> Result<JdVpc> {
        let req = self.request("vpc", "v1", &format!("vpcs/{}", id));
        let data = self.client().get(&req, "vpc").await?;
        Ok(JdVpc {
            region: self.clone(),
            data,
        })
    }
}

#[async_trait]
impl CloudResource for JdVpc {
    fn id(&self) -> &str {
        &self.data.vpc_id
    }

    fn name(&self) -> &str {
        &self.data.vpc_name
    }

    fn global_id(&self) -> String {
        self.data.vpc_id.clone()
    }

    fn status(&self) -> &'static str {
        VPC_AVAILABLE
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.data.created_time)
    }

    fn description(&self) -> &str {
        &self.data.description
    }

    async fn refresh(&mut self) -> Result<()> {
        self.data = self.region.get_vpc(&self.data.vpc_id).await?.data;
        Ok(())
    }
}

#[async_trait]
impl CloudVpc for JdVpc {
    fn region_id(&self) -> &str {
        self.region.id()
    }

    fn cidr_block(&self) -> &str {
        &self.data.address_prefix
    }

    fn is_default(&self) -> bool {
        false
    }

    async fn networks(&self) -> Result<Vec<Box<dyn CloudNetwork>>> {
        Ok(self
            .region
            .get_subnets(Some(&self.data.vpc_id))
            .await?
            .into_iter()
            .map(|n| Box::new(n) as Box<dyn CloudNetwork>)
            .collect())
    }

    async fn security_groups(&self) -> Result<Vec<Box<dyn CloudSecurityGroup>>> {
        Ok(self
            .region
            .get_security_groups(Some(&self.data.vpc_id))
            .await?
            .into_iter()
            .map(|g| Box::new(g) as Box<dyn CloudSecurityGroup>)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cloudprovider::CloudRegion;
    use crate::jdcloud::testing::{region, FakeTransport};

    #[tokio::test]
    async fn vpc_children_are_filtered_by_vpc() {
        let fake = FakeTransport::default();
        fake.ok(
            "vpc",
            "vpcs",
            json!({"vpcs": [{"vpcId": "vpc-1", "vpcName": "main", "addressPrefix": "10.0.0.0/16"}],
                   "totalCount": 1}),
        )
        .ok(
            "vpc",
            "subnets",
            json!({"subnets": [{"subnetId": "subnet-1", "vpcId": "vpc-1", "addressPrefix": "10.0.1.0/24"}],
                   "totalCount": 1}),
        )
        .ok("vpc", "networkSecurityGroups", json!({"networkSecurityGroups": [], "totalCount": 0}));
        let region = region(&fake);

        let vpcs = region.vpcs().await.unwrap();
        assert_eq!(vpcs.len(), 1);
        let vpc = &vpcs[0];
        assert_eq!(vpc.cidr_block(), "10.0.0.0/16");
        assert_eq!(vpc.status(), VPC_AVAILABLE);
        assert!(!vpc.is_default());

        let networks = vpc.networks().await.unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].vpc_id(), "vpc-1");
        assert!(vpc.security_groups().await.unwrap().is_empty());

        let filtered = fake
            .requests()
            .into_iter()
            .filter(|r| r.path == "subnets" || r.path == "networkSecurityGroups")
            .all(|r| r.query.contains(&("filters.1.values.1".to_string(), "vpc-1".to_string())));
        assert!(filtered);
    }
}
