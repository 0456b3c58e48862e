//! Field-mask construction for cluster parameter updates.
//!
//! Compares the observed cluster with the desired spec and emits an update
//! request naming exactly the changed paths. Host topology changes are not
//! handled here; they go through the topology reconciler.

use std::collections::BTreeSet;

use crate::api::types::{Cluster, ClusterConfig, ConfigSpec, UpdateClusterRequest};
use crate::spec::{RedisClusterSpec, RedisConfig, RedisVersion};

/// Mask path for the versioned engine-settings section
fn redis_config_path(version: RedisVersion) -> &'static str {
    match version {
        RedisVersion::V5_0 => "config_spec.redis_config_5_0",
        RedisVersion::V6_0 => "config_spec.redis_config_6_0",
    }
}

/// A spec tunable counts as changed only when it is set and disagrees with
/// the observed value; unset tunables keep the server default.
fn tunable_changed<T: PartialEq>(want: &Option<T>, got: &Option<T>) -> bool {
    want.is_some() && want != got
}

fn engine_settings_changed(observed: &ClusterConfig, desired: &RedisConfig) -> bool {
    tunable_changed(&desired.timeout, &observed.timeout)
        || tunable_changed(&desired.maxmemory_policy, &observed.maxmemory_policy)
        || tunable_changed(&desired.notify_keyspace_events, &observed.notify_keyspace_events)
        || tunable_changed(
            &desired.slowlog_log_slower_than,
            &observed.slowlog_log_slower_than,
        )
        || tunable_changed(&desired.slowlog_max_len, &observed.slowlog_max_len)
        || tunable_changed(&desired.databases, &observed.databases)
}

/// Build the masked update for every changed scalar field, or `None` when
/// nothing but topology differs.
pub fn build_update_request(
    cluster: &Cluster,
    spec: &RedisClusterSpec,
) -> Option<UpdateClusterRequest> {
    let mut req = UpdateClusterRequest::new(&cluster.id);

    if cluster.name != spec.name {
        req.name = Some(spec.name.clone());
        req.update_mask.push("name");
    }

    if cluster.description != spec.description {
        req.description = Some(spec.description.clone());
        req.update_mask.push("description");
    }

    if cluster.labels != spec.labels {
        req.labels = spec.labels.clone();
        req.update_mask.push("labels");
    }

    if cluster.config.resources != spec.resources {
        let config_spec = req.config_spec.get_or_insert_with(ConfigSpec::default);
        config_spec.resources = Some(spec.resources.clone());
        req.update_mask.push("config_spec.resources");
    }

    if engine_settings_changed(&cluster.config, &spec.config) {
        let config_spec = req.config_spec.get_or_insert_with(ConfigSpec::default);
        // The section is replaced wholesale, so the password rides along.
        config_spec.password = Some(spec.config.password.clone());
        config_spec.timeout = spec.config.timeout;
        config_spec.maxmemory_policy = spec.config.maxmemory_policy.clone();
        config_spec.notify_keyspace_events = spec.config.notify_keyspace_events.clone();
        config_spec.slowlog_log_slower_than = spec.config.slowlog_log_slower_than;
        config_spec.slowlog_max_len = spec.config.slowlog_max_len;
        config_spec.databases = spec.config.databases;
        req.update_mask.push(redis_config_path(spec.config.version));
    }

    let observed_groups: BTreeSet<&String> = cluster.security_group_ids.iter().collect();
    let desired_groups: BTreeSet<&String> = spec.security_group_ids.iter().collect();
    if observed_groups != desired_groups {
        req.security_group_ids = spec.security_group_ids.clone();
        req.update_mask.push("security_group_ids");
    }

    if let Some(mw) = &spec.maintenance_window {
        if cluster.maintenance_window.as_ref() != Some(mw) {
            req.maintenance_window = Some(mw.clone());
            req.update_mask.push("maintenance_window");
        }
    }

    if req.update_mask.is_empty() {
        None
    } else {
        Some(req)
    }
}
