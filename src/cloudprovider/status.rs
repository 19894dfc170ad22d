//! Provider-neutral status vocabularies

pub const VM_RUNNING: &str = "running";
pub const VM_READY: &str = "ready";
pub const VM_STARTING: &str = "starting";
pub const VM_STOPPING: &str = "stopping";
pub const VM_DEPLOYING: &str = "deploying";
pub const VM_DELETING: &str = "deleting";
pub const VM_REBUILD_ROOT: &str = "rebuild_root";
pub const VM_CHANGE_FLAVOR: &str = "change_flavor";
pub const VM_UNKNOWN: &str = "unknown";

pub const DISK_ALLOCATING: &str = "allocating";
pub const DISK_READY: &str = "ready";
pub const DISK_RESIZING: &str = "resizing";
pub const DISK_RESET: &str = "reset";
pub const DISK_DEALLOC: &str = "deallocating";
pub const DISK_ALLOC_FAILED: &str = "alloc_failed";
pub const DISK_DEALLOC_FAILED: &str = "dealloc_failed";
pub const DISK_RESET_FAILED: &str = "reset_failed";
pub const DISK_RESIZE_FAILED: &str = "resize_failed";
pub const DISK_UNKNOWN: &str = "unknown";

pub const DISK_TYPE_SYS: &str = "sys";
pub const DISK_TYPE_DATA: &str = "data";

pub const SNAPSHOT_CREATING: &str = "creating";
pub const SNAPSHOT_READY: &str = "ready";
pub const SNAPSHOT_DELETING: &str = "deleting";
pub const SNAPSHOT_FAILED: &str = "create_failed";
pub const SNAPSHOT_DELETE_FAILED: &str = "delete_failed";
pub const SNAPSHOT_UNKNOWN: &str = "unknown";

pub const NETWORK_AVAILABLE: &str = "available";
pub const VPC_AVAILABLE: &str = "available";
pub const SECGROUP_READY: &str = "ready";
pub const ZONE_ENABLE: &str = "enable";
pub const REGION_INSERVICE: &str = "inservice";
pub const HOST_ONLINE: &str = "online";

pub const DBINSTANCE_RUNNING: &str = "running";
pub const DBINSTANCE_DEPLOYING: &str = "deploying";
pub const DBINSTANCE_DELETING: &str = "deleting";
pub const DBINSTANCE_REBOOTING: &str = "rebooting";
pub const DBINSTANCE_CHANGE_CONFIG: &str = "change_config";
pub const DBINSTANCE_RESTORING: &str = "restoring";
pub const DBINSTANCE_MIGRATING: &str = "migrating";
pub const DBINSTANCE_UNKNOWN: &str = "unknown";

pub const BILLING_TYPE_POSTPAID: &str = "postpaid";
pub const BILLING_TYPE_PREPAID: &str = "prepaid";
