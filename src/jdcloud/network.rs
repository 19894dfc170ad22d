//! Subnets (`vpc/v1 subnets`)

use std::net::Ipv4Addr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ipnetwork::Ipv4Network;
use serde::Deserialize;

use super::region::JdRegion;
use super::{filter_query, parse_time};
use crate::cloudprovider::status::NETWORK_AVAILABLE;
use crate::cloudprovider::{CloudNetwork, CloudResource, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubnetDetail {
    pub subnet_id: String,
    pub subnet_name: String,
    pub route_table_id: String,
    pub acl_id: String,
    pub address_prefix: String,
    pub available_ip_count: i64,
    pub description: String,
    pub vpc_id: String,
    pub start_ip: String,
    pub end_ip: String,
    pub created_time: String,
}

#[derive(Clone)]
pub struct JdNetwork {
    region: JdRegion,
    data: SubnetDetail,
}

impl JdNetwork {
    fn cidr(&self) -> Option<Ipv4Network> {
        self.data.address_prefix.parse().ok()
    }

    /// `network + offset`, or the unspecified address for a bad CIDR
    fn host_at(&self, offset: u32) -> Ipv4Addr {
        match self.cidr() {
            Some(net) => Ipv4Addr::from(u32::from(net.network()).saturating_add(offset)),
            None => Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl JdRegion {
    pub async fn get_subnets(&self, vpc_id: Option<&str>) -> Result<Vec<JdNetwork>> {
        let vpc: Vec<String> = vpc_id.map(|v| vec![v.to_string()]).unwrap_or_default();
        let req = self
            .request("vpc", "v1", "subnets")
            .with_query(filter_query(&[("vpcId", &vpc)]));
        let items: Vec<SubnetDetail> = self.client().list_all(&req, "subnets").await?;
        Ok(items
            .into_iter()
            .map(|data| JdNetwork {
                region: self.clone(),
                data,
            })
            .collect())
    }

    pub async fn get_subnet(&self, id: &str) -> Result<JdNetwork> {
        let req = self.request("vpc", "v1", &format!("subnets/{}", id));
        let data = self.client().get(&req, "subnet").await?;
        Ok(JdNetwork {
            region: self.clone(),
            data,
        })
    }
}

#[async_trait]
impl CloudResource for JdNetwork {
    fn id(&self) -> &str {
        &self.data.subnet_id
    }

    fn name(&self) -> &str {
        &self.data.subnet_name
    }

    fn global_id(&self) -> String {
        self.data.subnet_id.clone()
    }

    fn status(&self) -> &'static str {
        NETWORK_AVAILABLE
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.data.created_time)
    }

    fn description(&self) -> &str {
        &self.data.description
    }

    async fn refresh(&mut self) -> Result<()> {
        self.data = self.region.get_subnet(&self.data.subnet_id).await?.data;
        Ok(())
    }
}

#[async_trait]
impl CloudNetwork for JdNetwork {
    fn vpc_id(&self) -> &str {
        &self.data.vpc_id
    }

    fn ip_start(&self) -> String {
        if !self.data.start_ip.is_empty() {
            return self.data.start_ip.clone();
        }
        // first address after the gateway
        self.host_at(2).to_string()
    }

    fn ip_end(&self) -> String {
        if !self.data.end_ip.is_empty() {
            return self.data.end_ip.clone();
        }
        match self.cidr() {
            Some(net) => Ipv4Addr::from(u32::from(net.broadcast()).saturating_sub(1)).to_string(),
            None => Ipv4Addr::UNSPECIFIED.to_string(),
        }
    }

    fn ip_mask(&self) -> u8 {
        self.cidr().map(|net| net.prefix()).unwrap_or(0)
    }

    fn gateway(&self) -> String {
        self.host_at(1).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jdcloud::testing::{region, FakeTransport};

    fn subnet(prefix: &str, start: &str, end: &str) -> JdNetwork {
        JdNetwork {
            region: region(&FakeTransport::default()),
            data: SubnetDetail {
                subnet_id: "subnet-1".into(),
                address_prefix: prefix.into(),
                start_ip: start.into(),
                end_ip: end.into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn range_is_derived_from_cidr() {
        let net = subnet("192.168.10.0/24", "", "");
        assert_eq!(net.gateway(), "192.168.10.1");
        assert_eq!(net.ip_start(), "192.168.10.2");
        assert_eq!(net.ip_end(), "192.168.10.254");
        assert_eq!(net.ip_mask(), 24);
    }

    #[test]
    fn explicit_range_wins() {
        let net = subnet("10.0.0.0/16", "10.0.0.10", "10.0.0.200");
        assert_eq!(net.gateway(), "10.0.0.1");
        assert_eq!(net.ip_start(), "10.0.0.10");
        assert_eq!(net.ip_end(), "10.0.0.200");
        assert_eq!(net.ip_mask(), 16);
    }

    #[test]
    fn bad_cidr() {
        let net = subnet("not-a-cidr", "", "");
        assert_eq!(net.gateway(), "0.0.0.0");
        assert_eq!(net.ip_mask(), 0);
    }
}
