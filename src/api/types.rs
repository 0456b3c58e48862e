//! Wire types for the managed Redis API.
//!
//! Observed state (`Cluster`, `Host`, `Shard`) is what the service reports
//! back and is kept separate from the desired-state model in
//! [`crate::spec`]. Request types mirror the JSON bodies the service
//! accepts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::spec::{Environment, MaintenanceWindow, RedisVersion, Resources};

/// Default page size for host/shard listings
pub const DEFAULT_PAGE_SIZE: i64 = 1000;

/// A managed Redis cluster as reported by the service
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub folder_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub network_id: String,
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sharded: bool,
    #[serde(default)]
    pub tls_enabled: bool,
    pub health: ClusterHealth,
    pub status: ClusterStatus,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub config: ClusterConfig,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_window: Option<MaintenanceWindow>,
}

/// Aggregate cluster health
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterHealth {
    Alive,
    Degraded,
    Dead,
    #[serde(other)]
    Unknown,
}

/// Cluster lifecycle status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterStatus {
    Creating,
    Running,
    Updating,
    Stopping,
    Stopped,
    Starting,
    Error,
    #[serde(other)]
    Unknown,
}

/// Effective engine configuration as reported by the service.
///
/// Unlike [`crate::spec::RedisConfig`] this never carries the password and
/// all tunables are resolved to concrete values by the service (they stay
/// optional here to survive partial responses).
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub version: RedisVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmemory_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_keyspace_events: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slowlog_log_slower_than: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slowlog_max_len: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databases: Option<i64>,
    pub resources: Resources,
}

/// One host of a cluster as reported by the service
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Fully qualified domain name, assigned by the service
    pub name: String,
    pub cluster_id: String,
    pub zone_id: String,
    #[serde(default)]
    pub subnet_id: String,
    /// Shard the host belongs to; every host belongs to exactly one shard
    #[serde(default)]
    pub shard_name: String,
    #[serde(default)]
    pub assign_public_ip: bool,
}

/// One shard of a sharded cluster
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Shard {
    pub name: String,
    pub cluster_id: String,
}

/// Host creation parameters, the wire form of [`crate::spec::HostSpec`]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostSpec {
    pub zone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub assign_public_ip: bool,
}

impl From<&crate::spec::HostSpec> for HostSpec {
    fn from(h: &crate::spec::HostSpec) -> Self {
        Self {
            zone_id: h.zone.clone(),
            shard_name: h.shard_name.clone(),
            subnet_id: h.subnet_id.clone(),
            assign_public_ip: h.assign_public_ip,
        }
    }
}

/// Engine configuration submitted on create/update
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<RedisVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmemory_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_keyspace_events: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slowlog_log_slower_than: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slowlog_max_len: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databases: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
}

impl ConfigSpec {
    /// Full config spec for cluster creation
    pub fn from_spec(config: &crate::spec::RedisConfig, resources: &Resources) -> Self {
        Self {
            version: Some(config.version),
            password: Some(config.password.clone()),
            timeout: config.timeout,
            maxmemory_policy: config.maxmemory_policy.clone(),
            notify_keyspace_events: config.notify_keyspace_events.clone(),
            slowlog_log_slower_than: config.slowlog_log_slower_than,
            slowlog_max_len: config.slowlog_max_len,
            databases: config.databases,
            resources: Some(resources.clone()),
        }
    }
}

/// Set of dotted field paths naming what an update touches
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    pub fn push(&mut self, path: &str) {
        self.paths.push(path.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    pub folder_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub network_id: String,
    pub environment: Environment,
    pub config_spec: ConfigSpec,
    pub host_specs: Vec<HostSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub sharded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterRequest {
    pub cluster_id: String,
    pub update_mask: FieldMask,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_spec: Option<ConfigSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_window: Option<MaintenanceWindow>,
}

impl UpdateClusterRequest {
    pub fn new(cluster_id: &str) -> Self {
        Self {
            cluster_id: cluster_id.to_string(),
            update_mask: FieldMask::default(),
            name: None,
            description: None,
            labels: BTreeMap::new(),
            config_spec: None,
            security_group_ids: Vec::new(),
            maintenance_window: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListHostsRequest {
    pub cluster_id: String,
    pub page_size: i64,
    #[serde(default)]
    pub page_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListHostsResponse {
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub next_page_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListShardsRequest {
    pub cluster_id: String,
    pub page_size: i64,
    #[serde(default)]
    pub page_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListShardsResponse {
    #[serde(default)]
    pub shards: Vec<Shard>,
    #[serde(default)]
    pub next_page_token: String,
}

/// A long-running operation handle returned by every mutating call
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub done: bool,
    /// Operation-specific metadata, e.g. the cluster id of a create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Set when the operation finished unsuccessfully
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
    /// Set when the operation finished successfully
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

impl Operation {
    /// Cluster id carried in create-operation metadata
    pub fn cluster_id_from_metadata(&self) -> Option<String> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("clusterId"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

/// Failure reported by an asynchronously completed operation
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}
