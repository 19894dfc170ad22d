//! Network security groups (`vpc/v1 networkSecurityGroups`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::region::JdRegion;
use super::{filter_query, parse_time};
use crate::cloudprovider::status::SECGROUP_READY;
use crate::cloudprovider::{
    CloudResource, CloudSecurityGroup, Result, RuleAction, RuleDirection, RuleProtocol,
    SecurityRule,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityGroupRuleDetail {
    pub rule_id: String,
    /// 0 ingress, 1 egress
    pub direction: i32,
    /// 300 all, 6 tcp, 17 udp, 1 icmp
    pub protocol: i32,
    pub address_prefix: String,
    pub ip_version: i32,
    pub from_port: u32,
    pub to_port: u32,
    pub created_time: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityGroupDetail {
    pub network_security_group_id: String,
    pub network_security_group_name: String,
    pub description: String,
    pub vpc_id: String,
    pub security_group_rules: Vec<SecurityGroupRuleDetail>,
    pub created_time: String,
}

fn rule_protocol(protocol: i32) -> RuleProtocol {
    match protocol {
        6 => RuleProtocol::Tcp,
        17 => RuleProtocol::Udp,
        1 => RuleProtocol::Icmp,
        _ => RuleProtocol::Any,
    }
}

fn rule_ports(protocol: RuleProtocol, from: u32, to: u32) -> String {
    let all_ports = from <= 1 && (to == 0 || to == 65535);
    if matches!(protocol, RuleProtocol::Any | RuleProtocol::Icmp) || all_ports {
        String::new()
    } else if from == to || to == 0 {
        from.to_string()
    } else {
        format!("{}-{}", from, to)
    }
}

impl SecurityGroupRuleDetail {
    fn to_rule(&self, priority: u32) -> SecurityRule {
        let protocol = rule_protocol(self.protocol);
        SecurityRule {
            id: self.rule_id.clone(),
            direction: if self.direction == 1 {
                RuleDirection::Out
            } else {
                RuleDirection::In
            },
            protocol,
            cidr: if self.address_prefix.is_empty() {
                "0.0.0.0/0".into()
            } else {
                self.address_prefix.clone()
            },
            ports: rule_ports(protocol, self.from_port, self.to_port),
            action: RuleAction::Allow,
            priority,
            description: self.description.clone(),
        }
    }
}

#[derive(Clone)]
pub struct JdSecurityGroup {
    region: JdRegion,
    data: SecurityGroupDetail,
}

impl JdRegion {
    pub async fn get_security_groups(&self, vpc_id: Option<&str>) -> Result<Vec<JdSecurityGroup>> {
        let vpc: Vec<String> = vpc_id.map(|v| vec![v.to_string()]).unwrap_or_default();
        let req = self
            .request("vpc", "v1", "networkSecurityGroups")
            .with_query(filter_query(&[("vpcId", &vpc)]));
        let items: Vec<SecurityGroupDetail> =
            self.client().list_all(&req, "networkSecurityGroups").await?;
        Ok(items
            .into_iter()
            .map(|data| JdSecurityGroup {
                region: self.clone(),
                data,
            })
            .collect())
    }

    pub async fn get_security_group(&self, id: &str) -> Result<JdSecurityGroup> {
        let req = self.request("vpc", "v1", &format!("networkSecurityGroups/{}", id));
        let data = self.client().get(&req, "networkSecurityGroup").await?;
        Ok(JdSecurityGroup {
            region: self.clone(),
            data,
        })
    }
}

#[async_trait]
impl CloudResource for JdSecurityGroup {
    fn id(&self) -> &str {
        &self.data.network_security_group_id
    }

    fn name(&self) -> &str {
        &self.data.network_security_group_name
    }

    fn global_id(&self) -> String {
        self.data.network_security_group_id.clone()
    }

    fn status(&self) -> &'static str {
        SECGROUP_READY
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.data.created_time)
    }

    fn description(&self) -> &str {
        &self.data.description
    }

    async fn refresh(&mut self) -> Result<()> {
        self.data = self
            .region
            .get_security_group(&self.data.network_security_group_id)
            .await?
            .data;
        Ok(())
    }
}

#[async_trait]
impl CloudSecurityGroup for JdSecurityGroup {
    fn vpc_id(&self) -> &str {
        &self.data.vpc_id
    }

    /// Rules in provider order; earlier rules get the lower priority number
    fn rules(&self) -> Vec<SecurityRule> {
        self.data
            .security_group_rules
            .iter()
            .enumerate()
            .map(|(i, rule)| rule.to_rule(i as u32 + 1))
            .collect()
    }
}
