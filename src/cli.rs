//! CLI definition using clap

use clap::{Args, Parser, Subcommand};

use crate::options::cloudaccounts::{
    AliyunCloudaccountCreateOptions, CloudaccountListOptions, JdcloudCloudaccountCreateOptions,
};
use crate::options::hosts::{HostListOptions, HostShowOptions};
use crate::options::pods::PodCreateOptions;
use crate::options::servers::{
    ServerBatchMetadataOptions, ServerCreateOptions, ServerDeleteOptions, ServerDeployOptions,
    ServerListOptions, ServerMetadataOptions, ServerShowOptions, ServerStartOptions,
    ServerStopOptions, ServerUpdateOptions,
};

#[derive(Parser)]
#[command(name = "climc")]
#[command(version)]
#[command(about = "Cloud management CLI")]
#[command(long_about = r#"
climc - cloud management CLI

Commands:
  server         Virtual servers on the region service
  host           Hosts registered with the region service
  cloud-account  Public cloud accounts
  pod            Container pods
  jd             Read JD Cloud resources directly

Configuration:
  CLIMC_REGION_URL / CLIMC_AUTH_TOKEN for the region service,
  JDCLOUD_ACCESS_KEY_ID / JDCLOUD_ACCESS_KEY_SECRET for JD Cloud.
  Values may also come from a .env file in $CLIMC_PROJECT_DIR.
"#)]
#[command(after_help = r#"
Examples:

  List running servers:
    climc server list --hypervisor kvm --details

  Preview the request for a new server:
    climc --dry-run server create web1 --mem-spec 2g --ncpu 2 --disk centos7

  List JD Cloud instances in Shanghai:
    climc jd --region cn-east-2 vm list
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Machine output mode (JSON Lines)
    #[arg(long, global = true)]
    pub agent: bool,

    /// Print tool metadata
    #[arg(long)]
    pub manifest: bool,

    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print region service requests instead of sending them
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Virtual server management
    Server(ServerCommand),

    /// Host management
    Host(HostCommand),

    /// Cloud account management
    #[command(name = "cloud-account")]
    CloudAccount(CloudAccountCommand),

    /// Container pod management
    Pod(PodCommand),

    /// JD Cloud resources
    Jd(JdCommand),
}

// ============ Server Commands ============

#[derive(Args)]
pub struct ServerCommand {
    #[command(subcommand)]
    pub action: ServerAction,
}

#[derive(Subcommand)]
pub enum ServerAction {
    /// List virtual servers
    #[command(after_help = "Examples:
  climc server list --hypervisor kvm --limit 50
  climc server list --tags user:env=prod --scope system")]
    List(ServerListOptions),

    /// Show details of a server
    Show(ServerShowOptions),

    /// Create a server
    #[command(after_help = "Examples:
  climc server create web1 --mem-spec 4g --ncpu 2 --disk centos7 --disk 100g --net vnet1")]
    Create(ServerCreateOptions),

    /// Update servers
    Update(ServerUpdateOptions),

    /// Start servers
    Start(ServerStartOptions),

    /// Stop servers
    Stop(ServerStopOptions),

    /// Delete servers
    Delete(ServerDeleteOptions),

    /// Deploy hostname and keypair to a stopped server
    #[command(after_help = "Examples:
  climc server deploy web1 --keypair ops --deploy /etc/motd:welcome")]
    Deploy(ServerDeployOptions),

    /// Add metadata tags to a server
    Metadata(ServerMetadataOptions),

    /// Add metadata tags to several servers
    BatchMetadata(ServerBatchMetadataOptions),
}

// ============ Host Commands ============

#[derive(Args)]
pub struct HostCommand {
    #[command(subcommand)]
    pub action: HostAction,
}

#[derive(Subcommand)]
pub enum HostAction {
    /// List hosts
    List(HostListOptions),

    /// Show details of a host
    Show(HostShowOptions),
}

// ============ Cloud Account Commands ============

#[derive(Args)]
pub struct CloudAccountCommand {
    #[command(subcommand)]
    pub action: CloudAccountAction,
}

#[derive(Subcommand)]
pub enum CloudAccountAction {
    /// List cloud accounts
    List(CloudaccountListOptions),

    /// Register a JD Cloud account
    #[command(after_help = "Examples:
  climc cloud-account create-jdcloud jd-prod AKID SECRET --enable-auto-sync")]
    CreateJdcloud(JdcloudCloudaccountCreateOptions),

    /// Register an Aliyun account
    CreateAliyun(AliyunCloudaccountCreateOptions),
}

// ============ Pod Commands ============

#[derive(Args)]
pub struct PodCommand {
    #[command(subcommand)]
    pub action: PodAction,
}

#[derive(Subcommand)]
pub enum PodAction {
    /// Create a pod
    #[command(after_help = "Examples:
  climc pod create nginx1 --image nginx:latest --port-mapping port=80,host_port=8080
  climc pod create data1 --image busybox --volume-mount mount_path=/data,disk_index=0")]
    Create(PodCreateOptions),
}

// ============ JD Cloud Commands ============

#[derive(Args)]
pub struct JdCommand {
    /// Region id
    #[arg(long, global = true, default_value = "cn-north-1")]
    pub region: String,

    #[command(subcommand)]
    pub action: JdAction,
}

#[derive(Subcommand)]
pub enum JdAction {
    /// Regions
    Region {
        #[command(subcommand)]
        action: JdListAction,
    },

    /// Availability zones
    Zone {
        #[command(subcommand)]
        action: JdListAction,
    },

    /// Emulated hosts (one per zone)
    Host {
        #[command(subcommand)]
        action: JdListAction,
    },

    /// Virtual machines
    Vm {
        #[command(subcommand)]
        action: JdVmAction,
    },

    /// Cloud disks
    Disk {
        #[command(subcommand)]
        action: JdShowAction,
    },

    /// VPCs
    Vpc {
        #[command(subcommand)]
        action: JdListAction,
    },

    /// Subnets
    Network {
        #[command(subcommand)]
        action: JdNetworkAction,
    },

    /// Security groups
    Secgroup {
        #[command(subcommand)]
        action: JdShowAction,
    },

    /// Disk snapshots
    Snapshot {
        #[command(subcommand)]
        action: JdListAction,
    },

    /// RDS instances
    Rds {
        #[command(subcommand)]
        action: JdShowAction,
    },

    /// Instance metric data
    #[command(after_help = "Examples:
  climc jd metric --id i-abc123 --metric cpu_util --minutes 30")]
    Metric {
        /// Instance id
        #[arg(long)]
        id: String,

        /// Metric name
        #[arg(long, default_value = "cpu_util")]
        metric: String,

        /// How far back to look, at most 30 days
        #[arg(long, default_value = "60", value_parser = clap::value_parser!(i64).range(1..=43200))]
        minutes: i64,
    },
}

#[derive(Subcommand)]
pub enum JdListAction {
    /// List resources
    List,
}

#[derive(Subcommand)]
pub enum JdShowAction {
    /// List resources
    List,

    /// Show one resource
    Show {
        /// Resource id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum JdNetworkAction {
    /// List subnets
    List {
        /// Only subnets of this VPC
        #[arg(long)]
        vpc: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum JdVmAction {
    /// List instances
    List {
        /// Only instances in this zone
        #[arg(long)]
        zone: Option<String>,
    },

    /// Show an instance with its disks
    Show {
        /// Instance id
        id: String,
    },

    /// Start an instance
    Start {
        /// Instance id
        id: String,
    },

    /// Stop an instance
    Stop {
        /// Instance id
        id: String,

        /// Force stop
        #[arg(long)]
        force: bool,
    },

    /// Delete an instance
    Delete {
        /// Instance id
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_server_stop() {
        let cli = Cli::try_parse_from(["climc", "--dry-run", "server", "stop", "web1", "web2", "--force"])
            .unwrap();
        assert!(cli.dry_run);
        match cli.command {
            Some(Commands::Server(ServerCommand {
                action: ServerAction::Stop(opts),
            })) => {
                assert_eq!(opts.servers.ids, vec!["web1", "web2"]);
                assert_eq!(opts.force, Some(true));
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn parses_jd_region_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["climc", "jd", "vm", "list", "--region", "cn-east-2"]).unwrap();
        match cli.command {
            Some(Commands::Jd(cmd)) => {
                assert_eq!(cmd.region, "cn-east-2");
                assert!(matches!(cmd.action, JdAction::Vm { action: JdVmAction::List { zone: None } }));
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn cloud_account_test_flag_does_not_clash_with_dry_run() {
        let cli = Cli::try_parse_from([
            "climc",
            "cloud-account",
            "create-jdcloud",
            "jd",
            "ak",
            "sk",
            "--test-create",
        ])
        .unwrap();
        assert!(!cli.dry_run);
        match cli.command {
            Some(Commands::CloudAccount(CloudAccountCommand {
                action: CloudAccountAction::CreateJdcloud(opts),
            })) => assert!(opts.base.dry_run),
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn metric_minutes_are_bounded() {
        for bad in ["0", "-5", "43201", "9223372036854775807"] {
            assert!(
                Cli::try_parse_from(["climc", "jd", "metric", "--id", "i-1", "--minutes", bad]).is_err(),
                "{} accepted",
                bad
            );
        }
        let cli = Cli::try_parse_from(["climc", "jd", "metric", "--id", "i-1", "--minutes", "43200"]).unwrap();
        match cli.command {
            Some(Commands::Jd(JdCommand {
                action: JdAction::Metric { minutes, .. },
                ..
            })) => assert_eq!(minutes, 43200),
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn help_examples_parse() {
        let examples: [&[&str]; 3] = [
            &["climc", "server", "list", "--hypervisor", "kvm", "--details"],
            &["climc", "--dry-run", "server", "create", "web1", "--mem-spec", "2g", "--ncpu", "2", "--disk", "centos7"],
            &["climc", "jd", "--region", "cn-east-2", "vm", "list"],
        ];
        for argv in examples {
            assert!(Cli::try_parse_from(argv.iter().copied()).is_ok(), "{:?}", argv);
        }
    }
}
