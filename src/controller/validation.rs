//! Validation logic for cluster specs and spec changes
//!
//! This module validates:
//! - Standalone spec consistency (hosts, config, maintenance window)
//! - Changes against an observed cluster, rejecting fields the service
//!   treats as immutable

use std::collections::BTreeSet;

use crate::api::types::Cluster;
use crate::controller::error::{Error, Result};
use crate::spec::{MaintenanceWindowType, RedisClusterSpec};

/// Minimum number of hosts in a cluster
pub const MIN_HOSTS: usize = 1;

/// Maximum number of hosts in a cluster (service quota default)
pub const MAX_HOSTS: usize = 32;

/// Validate a cluster spec in isolation
pub fn validate_spec(spec: &RedisClusterSpec) -> Result<()> {
    validate_hosts(spec)?;
    validate_config(spec)?;
    validate_maintenance_window(spec)?;
    Ok(())
}

fn validate_hosts(spec: &RedisClusterSpec) -> Result<()> {
    let count = spec.hosts.len();
    if count < MIN_HOSTS {
        return Err(Error::Validation(format!(
            "host count {} is below minimum {}",
            count, MIN_HOSTS
        )));
    }
    if count > MAX_HOSTS {
        return Err(Error::Validation(format!(
            "host count {} exceeds maximum {}",
            count, MAX_HOSTS
        )));
    }

    if !spec.sharded {
        let named: BTreeSet<&str> = spec
            .hosts
            .iter()
            .filter_map(|h| h.shard_name.as_deref())
            .collect();
        if named.len() > 1 {
            return Err(Error::Validation(format!(
                "hosts name {} different shards but sharding is disabled",
                named.len()
            )));
        }
    }

    for host in &spec.hosts {
        if host.zone.is_empty() {
            return Err(Error::Validation("host zone must not be empty".to_string()));
        }
    }

    Ok(())
}

fn validate_config(spec: &RedisClusterSpec) -> Result<()> {
    if spec.config.password.is_empty() {
        return Err(Error::Validation("password must not be empty".to_string()));
    }

    if let Some(databases) = spec.config.databases {
        if databases <= 0 {
            return Err(Error::Validation(format!(
                "databases must be positive, got {}",
                databases
            )));
        }
    }

    if spec.resources.disk_size <= 0 {
        return Err(Error::Validation(format!(
            "disk size must be positive, got {}",
            spec.resources.disk_size
        )));
    }

    Ok(())
}

fn validate_maintenance_window(spec: &RedisClusterSpec) -> Result<()> {
    let Some(mw) = &spec.maintenance_window else {
        return Ok(());
    };

    match mw.kind {
        MaintenanceWindowType::Anytime => {
            if mw.day.is_some() || mw.hour.is_some() {
                return Err(Error::Validation(
                    "ANYTIME maintenance window must not set day or hour".to_string(),
                ));
            }
        }
        MaintenanceWindowType::Weekly => {
            let Some(hour) = mw.hour else {
                return Err(Error::Validation(
                    "WEEKLY maintenance window requires an hour".to_string(),
                ));
            };
            if !(1..=24).contains(&hour) {
                return Err(Error::Validation(format!(
                    "maintenance window hour must be in 1..=24, got {}",
                    hour
                )));
            }
            if mw.day.is_none() {
                return Err(Error::Validation(
                    "WEEKLY maintenance window requires a day".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Validate a desired spec against an observed cluster, rejecting changes
/// the service cannot apply in place
pub fn validate_update(cluster: &Cluster, spec: &RedisClusterSpec) -> Result<()> {
    if cluster.config.version != spec.config.version {
        return Err(Error::Validation(format!(
            "version update is not supported (cluster runs {}, spec wants {})",
            cluster.config.version, spec.config.version
        )));
    }

    if cluster.config.resources.disk_type_id != spec.resources.disk_type_id
        && spec.resources.disk_type_id.is_some()
    {
        return Err(Error::Validation(
            "changing disk_type_id is not supported".to_string(),
        ));
    }

    if cluster.sharded != spec.sharded {
        return Err(Error::Validation(
            "sharded mode cannot be changed after creation".to_string(),
        ));
    }

    if let Some(tls) = spec.tls_enabled {
        if cluster.tls_enabled != tls {
            return Err(Error::Validation(
                "tls_enabled cannot be changed after creation".to_string(),
            ));
        }
    }

    if cluster.network_id != spec.network_id {
        return Err(Error::Validation(
            "network_id cannot be changed after creation".to_string(),
        ));
    }

    if cluster.environment != spec.environment {
        return Err(Error::Validation(
            "environment cannot be changed after creation".to_string(),
        ));
    }

    // Diffing identifies shard membership by name; a sharded update with
    // anonymous hosts would churn instead of converge.
    if spec.sharded {
        if let Some(host) = spec.hosts.iter().find(|h| h.shard_name.is_none()) {
            return Err(Error::Validation(format!(
                "host in zone {} must name its shard when updating a sharded cluster",
                host.zone
            )));
        }
    }

    Ok(())
}
