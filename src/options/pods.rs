//! Pod (container server) options and the volume-mount / port-mapping grammars

use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};

use super::{is_false, parse_bool, parse_size_mb, Options, Params, ParamsError};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMountType {
    Disk,
    HostPath,
    Text,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MountPropagation {
    Private,
    Rslave,
    Rshared,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HostPathType {
    Directory,
    File,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeMountDisk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_directory: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VolumeMountHostPath {
    pub path: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<HostPathType>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VolumeMountText {
    pub content: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContainerVolumeMount {
    #[serde(rename = "type")]
    pub kind: VolumeMountType,
    pub mount_path: String,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation: Option<MountPropagation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<VolumeMountDisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<VolumeMountHostPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<VolumeMountText>,
}

fn split_segment<'a>(field: &str, seg: &'a str) -> Result<(&'a str, &'a str), ParamsError> {
    match seg.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.trim(), v.trim())),
        _ => Err(ParamsError::invalid(field, seg, "expected key=value")),
    }
}

/// Parse `mount_path=/data,disk_index=0,read_only=true` style volume mounts.
pub fn parse_container_volume_mount(input: &str) -> Result<ContainerVolumeMount, ParamsError> {
    const FIELD: &str = "volume_mount";

    let mut kind = None;
    let mut mount_path = None;
    let mut read_only = false;
    let mut propagation = None;
    let mut disk = VolumeMountDisk::default();
    let mut host_path = None;
    let mut host_type = None;
    let mut text = None;

    for seg in input.split(',').filter(|s| !s.trim().is_empty()) {
        let (key, value) = split_segment(FIELD, seg)?;
        match key {
            "type" => {
                kind = Some(match value {
                    "disk" => VolumeMountType::Disk,
                    "host_path" => VolumeMountType::HostPath,
                    "text" => VolumeMountType::Text,
                    _ => return Err(ParamsError::invalid("type", value, "expected disk, host_path or text")),
                })
            }
            "mount_path" => mount_path = Some(value.to_string()),
            "read_only" | "readonly" => read_only = parse_bool(key, value)?,
            "propagation" => {
                propagation = Some(match value {
                    "private" => MountPropagation::Private,
                    "rslave" => MountPropagation::Rslave,
                    "rshared" => MountPropagation::Rshared,
                    _ => return Err(ParamsError::invalid("propagation", value, "expected private, rslave or rshared")),
                })
            }
            "disk_index" => {
                let idx = value
                    .parse()
                    .map_err(|_| ParamsError::invalid("disk_index", value, "not a number"))?;
                disk.index = Some(idx);
            }
            "disk_id" => disk.id = Some(value.to_string()),
            "disk_sub_dir" | "sub_dir" => disk.sub_directory = Some(value.to_string()),
            "host_path" => host_path = Some(value.to_string()),
            "host_type" => {
                host_type = Some(match value {
                    "directory" => HostPathType::Directory,
                    "file" => HostPathType::File,
                    _ => return Err(ParamsError::invalid("host_type", value, "expected directory or file")),
                })
            }
            "text" => text = Some(value.to_string()),
            _ => return Err(ParamsError::invalid(FIELD, seg, "unknown key")),
        }
    }

    let mount_path = mount_path
        .filter(|p| !p.is_empty())
        .ok_or(ParamsError::Missing("mount_path"))?;

    let has_disk = disk.index.is_some() || disk.id.is_some();
    let kind = match kind {
        Some(k) => k,
        None if has_disk => VolumeMountType::Disk,
        None if host_path.is_some() => VolumeMountType::HostPath,
        None if text.is_some() => VolumeMountType::Text,
        None => return Err(ParamsError::invalid(FIELD, input, "can't infer volume mount type")),
    };

    let mut mount = ContainerVolumeMount {
        kind,
        mount_path,
        read_only,
        propagation,
        disk: None,
        host_path: None,
        text: None,
    };
    match kind {
        VolumeMountType::Disk => {
            if !has_disk {
                return Err(ParamsError::invalid(FIELD, input, "disk_index or disk_id is required"));
            }
            mount.disk = Some(disk);
        }
        VolumeMountType::HostPath => {
            let path = host_path.ok_or(ParamsError::Missing("host_path"))?;
            mount.host_path = Some(VolumeMountHostPath { path, kind: host_type });
        }
        VolumeMountType::Text => {
            let content = text.ok_or(ParamsError::Missing("text"))?;
            mount.text = Some(VolumeMountText { content });
        }
    }
    Ok(mount)
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortProtocol {
    Tcp,
    Udp,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PodPortMapping {
    pub protocol: PortProtocol,
    pub container_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_port_range: Option<PortRange>,
}

fn parse_port(field: &str, value: &str) -> Result<u16, ParamsError> {
    match value.parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(ParamsError::invalid(field, value, "port must be within 1-65535")),
    }
}

/// Parse `port=80,host_port=8080,protocol=tcp` style port mappings.
pub fn parse_pod_port_mapping(input: &str) -> Result<PodPortMapping, ParamsError> {
    const FIELD: &str = "port_mapping";

    let mut protocol = PortProtocol::Tcp;
    let mut container_port = None;
    let mut host_port = None;
    let mut host_port_range = None;

    for seg in input.split(',').filter(|s| !s.trim().is_empty()) {
        let (key, value) = split_segment(FIELD, seg)?;
        match key {
            "port" | "container_port" => container_port = Some(parse_port(key, value)?),
            "host_port" => host_port = Some(parse_port(key, value)?),
            "protocol" | "proto" => {
                protocol = match value.to_ascii_lowercase().as_str() {
                    "tcp" => PortProtocol::Tcp,
                    "udp" => PortProtocol::Udp,
                    _ => return Err(ParamsError::invalid(key, value, "expected tcp or udp")),
                }
            }
            "host_port_range" => {
                let (start, end) = value
                    .split_once('-')
                    .ok_or_else(|| ParamsError::invalid(key, value, "expected <start>-<end>"))?;
                let start = parse_port(key, start)?;
                let end = parse_port(key, end)?;
                if start > end {
                    return Err(ParamsError::invalid(key, value, "start is greater than end"));
                }
                host_port_range = Some(PortRange { start, end });
            }
            _ => return Err(ParamsError::invalid(FIELD, seg, "unknown key")),
        }
    }

    let container_port = container_port.ok_or(ParamsError::Missing("container_port"))?;
    if host_port.is_some() && host_port_range.is_some() {
        return Err(ParamsError::invalid(FIELD, input, "host_port and host_port_range are exclusive"));
    }
    Ok(PodPortMapping {
        protocol,
        container_port,
        host_port,
        host_port_range,
    })
}

#[derive(Args, Debug, Default)]
pub struct PodCreateOptions {
    /// Name of the pod
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Container image
    #[arg(long)]
    pub image: String,

    /// Container command
    #[arg(long)]
    pub command: Option<String>,

    /// Container args
    #[arg(long = "arg")]
    pub args: Vec<String>,

    /// Container environment variables, KEY=VALUE
    #[arg(long)]
    pub env: Vec<String>,

    /// Volume mounts, e.g. mount_path=/data,disk_index=0
    #[arg(long)]
    pub volume_mount: Vec<String>,

    /// Port mappings, e.g. port=80,host_port=8080
    #[arg(long)]
    pub port_mapping: Vec<String>,

    /// CPU count
    #[arg(long, default_value_t = 1)]
    pub ncpu: u32,

    /// Memory size, e.g. 512m
    #[arg(long, default_value = "512m")]
    pub mem_spec: String,
}

impl Options for PodCreateOptions {
    fn params(&self) -> Result<Params, ParamsError> {
        if self.image.is_empty() {
            return Err(ParamsError::Missing("image"));
        }

        let mut container = Params::new();
        container.insert("image".into(), json!(self.image));
        if let Some(cmd) = self.command.as_deref() {
            let parts: Vec<&str> = cmd.split_whitespace().collect();
            if !parts.is_empty() {
                container.insert("command".into(), json!(parts));
            }
        }
        if !self.args.is_empty() {
            container.insert("args".into(), json!(self.args));
        }
        let envs = self
            .env
            .iter()
            .map(|e| match e.split_once('=') {
                Some((k, v)) if !k.is_empty() => Ok(json!({"key": k, "value": v})),
                _ => Err(ParamsError::invalid("env", e, "expected KEY=VALUE")),
            })
            .collect::<Result<Vec<Value>, _>>()?;
        if !envs.is_empty() {
            container.insert("envs".into(), Value::Array(envs));
        }
        let mounts = self
            .volume_mount
            .iter()
            .map(|m| parse_container_volume_mount(m))
            .collect::<Result<Vec<_>, _>>()?;
        if !mounts.is_empty() {
            container.insert("volume_mounts".into(), serde_json::to_value(mounts)?);
        }

        let mut pod = Params::new();
        pod.insert("containers".into(), json!([Value::Object(container)]));
        let ports = self
            .port_mapping
            .iter()
            .map(|p| parse_pod_port_mapping(p))
            .collect::<Result<Vec<_>, _>>()?;
        if !ports.is_empty() {
            pod.insert("port_mappings".into(), serde_json::to_value(ports)?);
        }

        let mut params = Params::new();
        params.insert("name".into(), json!(self.name));
        params.insert("hypervisor".into(), json!("pod"));
        params.insert("vcpu_count".into(), json!(self.ncpu));
        params.insert("vmem_size".into(), json!(parse_size_mb(&self.mem_spec, 'm')?));
        params.insert("pod".into(), Value::Object(pod));
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_volume_mount() {
        let vm = parse_container_volume_mount("mount_path=/data,disk_index=0,read_only=true,sub_dir=app").unwrap();
        assert_eq!(vm.kind, VolumeMountType::Disk);
        assert_eq!(vm.mount_path, "/data");
        assert!(vm.read_only);
        assert_eq!(
            vm.disk,
            Some(VolumeMountDisk { index: Some(0), id: None, sub_directory: Some("app".into()) })
        );
        assert_eq!(
            serde_json::to_value(&vm).unwrap(),
            json!({
                "type": "disk",
                "mount_path": "/data",
                "read_only": true,
                "disk": {"index": 0, "sub_directory": "app"}
            })
        );
    }

    #[test]
    fn host_path_volume_mount() {
        let vm = parse_container_volume_mount("host_path=/var/log,host_type=directory,mount_path=/logs,propagation=rslave").unwrap();
        assert_eq!(vm.kind, VolumeMountType::HostPath);
        assert_eq!(vm.propagation, Some(MountPropagation::Rslave));
        assert_eq!(
            vm.host_path,
            Some(VolumeMountHostPath { path: "/var/log".into(), kind: Some(HostPathType::Directory) })
        );
        assert!(vm.disk.is_none());
    }

    #[test]
    fn text_volume_mount() {
        let vm = parse_container_volume_mount("type=text,mount_path=/etc/motd,text=hello").unwrap();
        assert_eq!(vm.text, Some(VolumeMountText { content: "hello".into() }));
    }

    #[test]
    fn volume_mount_errors() {
        assert!(matches!(
            parse_container_volume_mount("disk_index=0"),
            Err(ParamsError::Missing("mount_path"))
        ));
        assert!(parse_container_volume_mount("mount_path=/data").is_err());
        assert!(parse_container_volume_mount("mount_path=/data,disk_index=x").is_err());
        assert!(parse_container_volume_mount("mount_path=/data,disk_index=0,read_only=maybe").is_err());
        assert!(parse_container_volume_mount("mount_path=/data,color=red").is_err());
        assert!(parse_container_volume_mount("mount_path=/data,disk_index").is_err());
        assert!(parse_container_volume_mount("type=disk,mount_path=/data").is_err());
        assert!(matches!(
            parse_container_volume_mount("type=host_path,mount_path=/data"),
            Err(ParamsError::Missing("host_path"))
        ));
    }

    #[test]
    fn port_mapping_defaults_to_tcp() {
        let pm = parse_pod_port_mapping("port=80,host_port=8080").unwrap();
        assert_eq!(
            pm,
            PodPortMapping {
                protocol: PortProtocol::Tcp,
                container_port: 80,
                host_port: Some(8080),
                host_port_range: None,
            }
        );
    }

    #[test]
    fn port_mapping_with_range() {
        let pm = parse_pod_port_mapping("container_port=53,proto=UDP,host_port_range=20000-20010").unwrap();
        assert_eq!(pm.protocol, PortProtocol::Udp);
        assert_eq!(pm.host_port_range, Some(PortRange { start: 20000, end: 20010 }));
        assert_eq!(
            serde_json::to_value(&pm).unwrap(),
            json!({
                "protocol": "udp",
                "container_port": 53,
                "host_port_range": {"start": 20000, "end": 20010}
            })
        );
    }

    #[test]
    fn port_mapping_errors() {
        assert!(matches!(
            parse_pod_port_mapping("host_port=8080"),
            Err(ParamsError::Missing("container_port"))
        ));
        assert!(parse_pod_port_mapping("port=0").is_err());
        assert!(parse_pod_port_mapping("port=70000").is_err());
        assert!(parse_pod_port_mapping("port=80,protocol=sctp").is_err());
        assert!(parse_pod_port_mapping("port=80,host_port_range=30-20").is_err());
        assert!(parse_pod_port_mapping("port=80,host_port=1,host_port_range=20-30").is_err());
        assert!(parse_pod_port_mapping("port").is_err());
    }

    #[test]
    fn pod_create_params() {
        let opts = PodCreateOptions {
            name: "nginx".into(),
            image: "nginx:1.25".into(),
            command: Some("nginx -g daemon".into()),
            env: vec!["TZ=UTC".into()],
            volume_mount: vec!["mount_path=/data,disk_index=0".into()],
            port_mapping: vec!["port=80".into()],
            ncpu: 2,
            mem_spec: "1g".into(),
            ..Default::default()
        };
        let params = opts.params().unwrap();
        assert_eq!(
            Value::Object(params),
            json!({
                "name": "nginx",
                "hypervisor": "pod",
                "vcpu_count": 2,
                "vmem_size": 1024,
                "pod": {
                    "containers": [{
                        "image": "nginx:1.25",
                        "command": ["nginx", "-g", "daemon"],
                        "envs": [{"key": "TZ", "value": "UTC"}],
                        "volume_mounts": [{
                            "type": "disk",
                            "mount_path": "/data",
                            "disk": {"index": 0}
                        }]
                    }],
                    "port_mappings": [{"protocol": "tcp", "container_port": 80}]
                }
            })
        );
    }
}
