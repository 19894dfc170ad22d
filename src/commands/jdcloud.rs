//! JD Cloud commands
//!
//! Each command walks the provider-neutral traits and prints a summary, so
//! the output shape does not depend on the JD Cloud wire format.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::cli::{JdAction, JdCommand, JdListAction, JdNetworkAction, JdShowAction, JdVmAction};
use crate::cloudprovider::{
    CloudDbInstance, CloudDisk, CloudHost, CloudNetwork, CloudRegion, CloudResource,
    CloudSecurityGroup, CloudSnapshot, CloudVm, CloudVpc, CloudZone,
};
use crate::config;
use crate::jdcloud::{self, JdCloudClient};
use crate::options::ParamsError;
use crate::output::Output;

pub async fn run(cmd: JdCommand, out: &Output) -> Result<()> {
    config::load_env()?;
    let cfg = config::jdcloud_config()?;
    let client = Arc::new(JdCloudClient::new(&cfg)?);
    out.debug(&format!(
        "JD Cloud endpoint {}://*.{} region {}",
        cfg.scheme, cfg.endpoint_suffix, cmd.region
    ));

    let (op, data) = query(client, &cmd.region, cmd.action)
        .await
        .with_context(|| format!("JD Cloud region {}", cmd.region))?;
    out.result(json!({
        "success": true,
        "op": op,
        "data": data,
    }));
    Ok(())
}

async fn query(client: Arc<JdCloudClient>, region_id: &str, action: JdAction) -> Result<(&'static str, Value)> {
    let region = || jdcloud::region(client.clone(), region_id);
    let result = match action {
        JdAction::Region { action: JdListAction::List } => {
            let regions = jdcloud::regions(client.clone());
            ("jd.region.list", regions.iter().map(|r| region_summary(r)).collect())
        }
        JdAction::Zone { action: JdListAction::List } => {
            let zones = region()?.zones().await?;
            ("jd.zone.list", zones.iter().map(|z| zone_summary(z.as_ref())).collect())
        }
        JdAction::Host { action: JdListAction::List } => {
            let hosts = region()?.hosts().await?;
            ("jd.host.list", hosts.iter().map(|h| host_summary(h.as_ref())).collect())
        }
        JdAction::Vm { action } => vm_action(&region()?, action).await?,
        JdAction::Disk { action: JdShowAction::List } => {
            let disks = region()?.disks().await?;
            ("jd.disk.list", disks.iter().map(|d| disk_summary(d.as_ref())).collect())
        }
        JdAction::Disk { action: JdShowAction::Show { id } } => {
            let disk = region()?.disk_by_id(&id).await?;
            ("jd.disk.show", disk_summary(disk.as_ref()))
        }
        JdAction::Vpc { action: JdListAction::List } => {
            let vpcs = region()?.vpcs().await?;
            ("jd.vpc.list", vpcs.iter().map(|v| vpc_summary(v.as_ref())).collect())
        }
        JdAction::Network { action: JdNetworkAction::List { vpc } } => {
            let region = region()?;
            let vpcs = match vpc {
                Some(id) => vec![region.vpc_by_id(&id).await?],
                None => region.vpcs().await?,
            };
            let mut data = Vec::new();
            for vpc in vpcs {
                data.extend(vpc.networks().await?.iter().map(|n| network_summary(n.as_ref())));
            }
            ("jd.network.list", Value::Array(data))
        }
        JdAction::Secgroup { action: JdShowAction::List } => {
            let groups = region()?.security_groups().await?;
            ("jd.secgroup.list", groups.iter().map(|g| secgroup_summary(g.as_ref())).collect())
        }
        JdAction::Secgroup { action: JdShowAction::Show { id } } => {
            let group = region()?.security_group_by_id(&id).await?;
            ("jd.secgroup.show", secgroup_summary(group.as_ref()))
        }
        JdAction::Snapshot { action: JdListAction::List } => {
            let snapshots = region()?.snapshots().await?;
            ("jd.snapshot.list", snapshots.iter().map(|s| snapshot_summary(s.as_ref())).collect())
        }
        JdAction::Rds { action: JdShowAction::List } => {
            let instances = region()?.db_instances().await?;
            ("jd.rds.list", instances.iter().map(|d| rds_summary(d.as_ref())).collect())
        }
        JdAction::Rds { action: JdShowAction::Show { id } } => {
            let instance = region()?.db_instance_by_id(&id).await?;
            ("jd.rds.show", rds_summary(instance.as_ref()))
        }
        JdAction::Metric { id, metric, minutes } => {
            let window = Duration::try_minutes(minutes)
                .filter(|w| *w > Duration::zero())
                .ok_or_else(|| {
                    ParamsError::invalid("minutes", &minutes.to_string(), "not a positive duration")
                })?;
            let end = Utc::now();
            let start = end - window;
            let points = region()?.vm_metric(&id, &metric, start, end).await?;
            (
                "jd.metric",
                json!({
                    "instance_id": id,
                    "metric": metric,
                    "start": start,
                    "end": end,
                    "points": points,
                }),
            )
        }
    };
    Ok(result)
}

async fn vm_action(region: &jdcloud::JdRegion, action: JdVmAction) -> Result<(&'static str, Value)> {
    let result = match action {
        JdVmAction::List { zone } => {
            let vms = match zone {
                Some(zone) => {
                    let mut vms = Vec::new();
                    for host in region.zone_by_id(&zone).await?.hosts().await? {
                        vms.extend(host.vms().await?);
                    }
                    vms
                }
                None => region.vms().await?,
            };
            ("jd.vm.list", vms.iter().map(|vm| vm_summary(vm.as_ref())).collect())
        }
        JdVmAction::Show { id } => {
            let vm = region.vm_by_id(&id).await?;
            let disks = vm.disks().await?;
            let mut data = vm_summary(vm.as_ref());
            data["disks"] = disks.iter().map(|d| disk_summary(d.as_ref())).collect();
            ("jd.vm.show", data)
        }
        JdVmAction::Start { id } => {
            region.vm_by_id(&id).await?.start().await?;
            ("jd.vm.start", json!({"id": id}))
        }
        JdVmAction::Stop { id, force } => {
            region.vm_by_id(&id).await?.stop(force).await?;
            ("jd.vm.stop", json!({"id": id}))
        }
        JdVmAction::Delete { id } => {
            region.vm_by_id(&id).await?.delete().await?;
            ("jd.vm.delete", json!({"id": id}))
        }
    };
    Ok(result)
}

// ============ Summaries ============

fn resource_fields<R: CloudResource + ?Sized>(r: &R) -> Value {
    json!({
        "id": r.id(),
        "name": r.name(),
        "global_id": r.global_id(),
        "status": r.status(),
        "created_at": r.created_at(),
        "description": r.description(),
        "tags": r.tags(),
        "emulated": r.is_emulated(),
    })
}

fn merge(mut base: Value, extra: Value) -> Value {
    if let (Value::Object(base), Value::Object(extra)) = (&mut base, extra) {
        base.extend(extra);
    }
    base
}

fn region_summary(r: &dyn CloudRegion) -> Value {
    merge(
        resource_fields(r),
        json!({
            "provider": r.provider(),
            "geographic_info": r.geographic_info(),
        }),
    )
}

fn zone_summary(z: &dyn CloudZone) -> Value {
    merge(resource_fields(z), json!({"region_id": z.region_id()}))
}

fn host_summary(h: &dyn CloudHost) -> Value {
    merge(
        resource_fields(h),
        json!({
            "zone_id": h.zone_id(),
            "host_status": h.host_status(),
            "host_type": h.host_type(),
        }),
    )
}

fn vm_summary(vm: &dyn CloudVm) -> Value {
    merge(
        resource_fields(vm),
        json!({
            "hostname": vm.hostname(),
            "host_id": vm.host_id(),
            "zone_id": vm.zone_id(),
            "instance_type": vm.instance_type(),
            "vcpu_count": vm.vcpu_count(),
            "vmem_size_mb": vm.vmem_size_mb(),
            "os_type": vm.os_type(),
            "hypervisor": vm.hypervisor(),
            "billing_type": vm.billing_type(),
            "expired_at": vm.expired_at(),
            "security_group_ids": vm.security_group_ids(),
            "nics": vm.nics(),
            "eip": vm.eip(),
        }),
    )
}

fn disk_summary(d: &dyn CloudDisk) -> Value {
    merge(
        resource_fields(d),
        json!({
            "size_mb": d.size_mb(),
            "disk_type": d.disk_type(),
            "storage_type": d.storage_type(),
            "zone_id": d.zone_id(),
            "auto_delete": d.is_auto_delete(),
            "template_id": d.template_id(),
            "mount_instance_ids": d.mount_instance_ids(),
        }),
    )
}

fn vpc_summary(v: &dyn CloudVpc) -> Value {
    merge(
        resource_fields(v),
        json!({
            "region_id": v.region_id(),
            "cidr_block": v.cidr_block(),
            "is_default": v.is_default(),
        }),
    )
}

fn network_summary(n: &dyn CloudNetwork) -> Value {
    merge(
        resource_fields(n),
        json!({
            "vpc_id": n.vpc_id(),
            "ip_start": n.ip_start(),
            "ip_end": n.ip_end(),
            "ip_mask": n.ip_mask(),
            "gateway": n.gateway(),
            "server_type": n.server_type(),
        }),
    )
}

fn secgroup_summary(g: &dyn CloudSecurityGroup) -> Value {
    merge(
        resource_fields(g),
        json!({
            "vpc_id": g.vpc_id(),
            "rules": g.rules(),
        }),
    )
}

fn snapshot_summary(s: &dyn CloudSnapshot) -> Value {
    merge(
        resource_fields(s),
        json!({
            "size_gb": s.size_gb(),
            "disk_id": s.disk_id(),
            "disk_type": s.disk_type(),
        }),
    )
}

fn rds_summary(d: &dyn CloudDbInstance) -> Value {
    merge(
        resource_fields(d),
        json!({
            "engine": d.engine(),
            "engine_version": d.engine_version(),
            "instance_class": d.instance_class(),
            "vcpu_count": d.vcpu_count(),
            "vmem_size_mb": d.vmem_size_mb(),
            "disk_size_gb": d.disk_size_gb(),
            "storage_type": d.storage_type(),
            "zone_ids": d.zone_ids(),
            "vpc_id": d.vpc_id(),
            "connection_str": d.connection_str(),
            "internal_connection_str": d.internal_connection_str(),
            "port": d.port(),
            "billing_type": d.billing_type(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudprovider::CloudError;
    use crate::jdcloud::testing::{client, FakeTransport};

    #[tokio::test]
    async fn region_list_comes_from_catalog() {
        let fake = FakeTransport::default();
        let (op, data) = query(client(&fake), "cn-north-1", JdAction::Region { action: JdListAction::List })
            .await
            .unwrap();
        assert_eq!(op, "jd.region.list");
        let ids: Vec<&str> = data
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"cn-north-1"));
        assert!(ids.contains(&"cn-east-2"));
        assert_eq!(data[0]["provider"], "JDcloud");
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn region_list_ignores_region_flag() {
        let fake = FakeTransport::default();
        let (_, data) = query(client(&fake), "mars-1", JdAction::Region { action: JdListAction::List })
            .await
            .unwrap();
        assert_eq!(data.as_array().unwrap().len(), jdcloud::REGIONS.len());
    }

    #[tokio::test]
    async fn disk_list_includes_unattached_disks() {
        let fake = FakeTransport::default();
        fake.ok("vm", "instances", json!({"instances": [], "totalCount": 0}))
            .ok(
                "disk",
                "disks",
                json!({"disks": [{"diskId": "vol-free", "status": "available"}], "totalCount": 1}),
            );
        let (op, data) = query(client(&fake), "cn-north-1", JdAction::Disk { action: JdShowAction::List })
            .await
            .unwrap();
        assert_eq!(op, "jd.disk.list");
        let disks = data.as_array().unwrap();
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0]["id"], "vol-free");
        assert_eq!(disks[0]["disk_type"], "data");
    }

    #[tokio::test]
    async fn metric_window_must_be_positive() {
        for minutes in [0, -10, i64::MAX] {
            let fake = FakeTransport::default();
            let err = query(
                client(&fake),
                "cn-north-1",
                JdAction::Metric {
                    id: "i-1".into(),
                    metric: "cpu_util".into(),
                    minutes,
                },
            )
            .await
            .unwrap_err();
            assert!(err.downcast_ref::<ParamsError>().is_some(), "{}", minutes);
            assert!(fake.requests().is_empty());
        }
    }

    #[tokio::test]
    async fn unknown_region_is_not_found() {
        let fake = FakeTransport::default();
        let err = query(client(&fake), "mars-1", JdAction::Zone { action: JdListAction::List })
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<CloudError>(), Some(CloudError::NotFound(_))));
    }

    #[tokio::test]
    async fn host_list_is_one_per_zone() {
        let fake = FakeTransport::default();
        let (_, data) = query(client(&fake), "cn-east-1", JdAction::Host { action: JdListAction::List })
            .await
            .unwrap();
        let hosts = data.as_array().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0]["id"], "ak-test-cn-east-1a");
        assert_eq!(hosts[0]["emulated"], true);
    }

    #[tokio::test]
    async fn secgroup_show_includes_rules() {
        let fake = FakeTransport::default();
        fake.ok(
            "vpc",
            "networkSecurityGroups/sg-1",
            json!({"networkSecurityGroup": {
                "networkSecurityGroupId": "sg-1",
                "networkSecurityGroupName": "web",
                "vpcId": "vpc-1",
                "securityGroupRules": [{
                    "ruleId": "r-1",
                    "direction": 0,
                    "protocol": 6,
                    "addressPrefix": "10.0.0.0/8",
                    "fromPort": 22,
                    "toPort": 22
                }]
            }}),
        );
        let (op, data) = query(
            client(&fake),
            "cn-north-1",
            JdAction::Secgroup {
                action: JdShowAction::Show { id: "sg-1".into() },
            },
        )
        .await
        .unwrap();
        assert_eq!(op, "jd.secgroup.show");
        assert_eq!(data["vpc_id"], "vpc-1");
        assert_eq!(data["rules"][0]["protocol"], "tcp");
        assert_eq!(data["rules"][0]["ports"], "22");
    }

    #[tokio::test]
    async fn vm_mutations_are_not_implemented() {
        let fake = FakeTransport::default();
        fake.ok(
            "vm",
            "instances/i-1",
            json!({"instance": {"instanceId": "i-1", "instanceName": "web", "az": "cn-north-1a"}}),
        );
        fake.ok("vm", "instanceTypes", json!({"instanceTypes": []}));
        let err = query(
            client(&fake),
            "cn-north-1",
            JdAction::Vm {
                action: JdVmAction::Start { id: "i-1".into() },
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CloudError>(),
            Some(CloudError::NotImplemented(_))
        ));
    }
}
