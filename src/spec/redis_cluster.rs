//! Desired-state model for a managed Redis cluster.
//!
//! These types describe what the user wants the cluster to look like. They
//! are deserialized from a YAML spec file and never carry server-assigned
//! data; everything the remote service reports back (fqdns, health, status,
//! timestamps) lives in [`crate::api::types`] instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Desired state of a managed Redis cluster.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct RedisClusterSpec {
    /// Cluster name, unique within the folder
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Deployment environment
    pub environment: Environment,

    /// Network the cluster hosts attach to
    pub network_id: String,

    /// Folder to create the cluster in; falls back to the operator-wide
    /// default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,

    /// Free-form resource labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Whether the cluster runs in sharded (cluster) mode.
    /// Cannot be changed after creation.
    #[serde(default)]
    pub sharded: bool,

    /// Whether client connections require TLS.
    /// Cannot be changed after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_enabled: Option<bool>,

    /// Redis engine configuration
    pub config: RedisConfig,

    /// Host resource allocation
    pub resources: Resources,

    /// Desired host topology, one entry per host
    pub hosts: Vec<HostSpec>,

    /// Security groups attached to the cluster
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,

    /// Maintenance window; server default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_window: Option<MaintenanceWindow>,
}

/// Deployment environment of a cluster
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[serde(rename = "PRODUCTION")]
    Production,
    #[serde(rename = "PRESTABLE")]
    Prestable,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "PRODUCTION"),
            Environment::Prestable => write!(f, "PRESTABLE"),
        }
    }
}

/// Supported Redis engine versions
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedisVersion {
    #[serde(rename = "5.0")]
    V5_0,
    #[serde(rename = "6.0")]
    V6_0,
}

impl RedisVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedisVersion::V5_0 => "5.0",
            RedisVersion::V6_0 => "6.0",
        }
    }
}

impl fmt::Display for RedisVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redis engine configuration.
///
/// Tunables left as `None` keep their server-side defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RedisConfig {
    /// Engine version. Cannot be changed after creation.
    pub version: RedisVersion,

    /// AUTH password for client connections
    pub password: String,

    /// Client idle timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,

    /// Key eviction policy (e.g. "ALLKEYS_LRU")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmemory_policy: Option<String>,

    /// Keyspace notification classes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_keyspace_events: Option<String>,

    /// Slowlog threshold in microseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slowlog_log_slower_than: Option<i64>,

    /// Slowlog history length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slowlog_max_len: Option<i64>,

    /// Number of logical databases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databases: Option<i64>,
}

/// Host resource allocation for every host in the cluster
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Resources {
    /// Flavor of the hosts (CPU/memory preset)
    pub resource_preset_id: String,

    /// Disk size in bytes
    pub disk_size: i64,

    /// Disk type. Cannot be changed after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type_id: Option<String>,
}

/// One desired host of the cluster topology.
///
/// Hosts are identified for reconciliation purposes by zone and subnet,
/// never by fqdn: fqdns are assigned by the remote service and unknown
/// before creation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HostSpec {
    /// Availability zone the host is placed in
    pub zone: String,

    /// Shard this host belongs to. Only meaningful in sharded mode; when
    /// empty at creation time the remote service assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_name: Option<String>,

    /// Subnet to attach the host to; the service picks one in the zone
    /// when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,

    /// Whether the host gets a public IP address
    #[serde(default)]
    pub assign_public_ip: bool,
}

/// Maintenance window configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MaintenanceWindow {
    /// ANYTIME or WEEKLY
    #[serde(rename = "type")]
    pub kind: MaintenanceWindowType,

    /// Day of week, WEEKLY only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<WeekDay>,

    /// Hour of day in 1..=24, WEEKLY only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaintenanceWindowType {
    #[serde(rename = "ANYTIME")]
    Anytime,
    #[serde(rename = "WEEKLY")]
    Weekly,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeekDay {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}
