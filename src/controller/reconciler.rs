//! Reconciliation logic for managed Redis clusters
//!
//! One-shot diff-and-apply: read fresh state from the service, compute the
//! topology diff, then issue the add/delete/rebalance calls strictly in
//! sequence, waiting on each long-running operation before the next. No
//! rollback is attempted; a failure mid-sequence leaves the cluster
//! partially converged and the next run picks up the remainder.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::api::types::{
    Cluster, CreateClusterRequest, ConfigSpec, Host, HostSpec, Shard, UpdateClusterRequest,
};
use crate::api::{self, OperationHandle};
use crate::controller::context::Context;
use crate::controller::error::{Error, Result};
use crate::controller::topology::{self, TopologyDiff};
use crate::controller::update::build_update_request;
use crate::controller::validation::{validate_spec, validate_update};
use crate::spec::{MaintenanceWindow, RedisClusterSpec};

/// Cluster state as reported by the service, hosts ordered against the
/// desired list when one was supplied
#[derive(Serialize, Clone, Debug)]
pub struct ObservedCluster {
    pub cluster: Cluster,
    pub hosts: Vec<Host>,
}

/// What an update would do, without doing it
#[derive(Serialize, Clone, Debug)]
pub struct ReconcilePlan {
    /// Host/shard topology changes
    pub topology: TopologyDiff,
    /// Field-mask paths a parameter update would carry
    pub update_paths: Vec<String>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.topology.is_empty() && self.update_paths.is_empty()
    }
}

async fn with_timeout<T>(
    limit: Duration,
    action: &'static str,
    cluster: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(Error::Timeout {
            action,
            cluster: cluster.to_string(),
            after: limit,
        }),
    }
}

fn expand_hosts(spec: &RedisClusterSpec) -> Vec<HostSpec> {
    spec.hosts.iter().map(Into::into).collect()
}

fn build_create_request(spec: &RedisClusterSpec, folder_id: String) -> CreateClusterRequest {
    CreateClusterRequest {
        folder_id,
        name: spec.name.clone(),
        description: spec.description.clone(),
        network_id: spec.network_id.clone(),
        environment: spec.environment,
        config_spec: ConfigSpec::from_spec(&spec.config, &spec.resources),
        host_specs: expand_hosts(spec),
        labels: spec.labels.clone(),
        sharded: spec.sharded,
        tls_enabled: spec.tls_enabled,
        security_group_ids: spec.security_group_ids.clone(),
    }
}

/// Create a cluster from the spec and wait for it to come up.
///
/// The cluster id is taken from the create operation's metadata before
/// waiting, so a creation that later fails still reports which cluster to
/// inspect. The maintenance window is applied afterwards with a masked
/// update; the create call ignores it.
#[instrument(skip(ctx, spec), fields(name = %spec.name))]
pub async fn create_cluster(ctx: &Context, spec: &RedisClusterSpec) -> Result<String> {
    validate_spec(spec)?;

    let folder_id = spec
        .folder_id
        .clone()
        .or_else(|| ctx.default_folder_id.clone())
        .ok_or_else(|| {
            Error::Validation("spec names no folder_id and no default is configured".to_string())
        })?;

    let req = build_create_request(spec, folder_id);

    with_timeout(ctx.timeouts.create, "creating", &spec.name, async {
        info!("creating cluster");
        let op = ctx
            .api
            .create_cluster(&req)
            .await
            .map_err(Error::operation("requesting cluster creation", &spec.name))?;

        let handle = OperationHandle::new(ctx.api.clone(), op);
        let cluster_id = handle
            .cluster_id_from_metadata()
            .map_err(Error::operation("reading create metadata", &spec.name))?;
        info!(%cluster_id, "cluster creation started");

        handle
            .wait()
            .await
            .map_err(Error::operation("creating cluster", &cluster_id))?;

        if let Some(mw) = &spec.maintenance_window {
            apply_maintenance_window(ctx, &cluster_id, mw).await?;
        }

        info!(%cluster_id, "cluster created");
        Ok(cluster_id)
    })
    .await
}

async fn apply_maintenance_window(
    ctx: &Context,
    cluster_id: &str,
    mw: &MaintenanceWindow,
) -> Result<()> {
    let mut req = UpdateClusterRequest::new(cluster_id);
    req.maintenance_window = Some(mw.clone());
    req.update_mask.push("maintenance_window");

    let op = ctx.api.update_cluster(&req).await.map_err(Error::operation(
        "requesting maintenance window update",
        cluster_id,
    ))?;
    OperationHandle::new(ctx.api.clone(), op)
        .wait()
        .await
        .map_err(Error::operation("updating maintenance window", cluster_id))?;
    Ok(())
}

/// Read the cluster and its full (paginated) host list.
///
/// When a desired spec is given, observed hosts are reordered to line up
/// with it so pure ordering differences do not read as drift.
#[instrument(skip(ctx, desired), fields(cluster = %cluster_id))]
pub async fn read_cluster(
    ctx: &Context,
    cluster_id: &str,
    desired: Option<&RedisClusterSpec>,
) -> Result<ObservedCluster> {
    let cluster = ctx.api.get_cluster(cluster_id).await.map_err(|e| {
        if e.is_not_found() {
            Error::NotFound(cluster_id.to_string())
        } else {
            Error::operation("reading cluster", cluster_id)(e)
        }
    })?;

    let mut hosts = api::list_all_hosts(ctx.api.as_ref(), cluster_id)
        .await
        .map_err(Error::operation("listing hosts", cluster_id))?;

    if let Some(spec) = desired {
        let want = expand_hosts(spec);
        topology::sort_hosts(&mut hosts, &want);
    }

    Ok(ObservedCluster { cluster, hosts })
}

/// Compute what an update would change, without side effects
#[instrument(skip(ctx, spec), fields(cluster = %cluster_id))]
pub async fn plan(ctx: &Context, cluster_id: &str, spec: &RedisClusterSpec) -> Result<ReconcilePlan> {
    validate_spec(spec)?;
    let observed = read_cluster(ctx, cluster_id, Some(spec)).await?;
    validate_update(&observed.cluster, spec)?;

    let desired = expand_hosts(spec);
    let topology = topology::diff_hosts(&observed.hosts, &desired, spec.sharded);
    let update_paths = build_update_request(&observed.cluster, spec)
        .map(|req| req.update_mask.paths)
        .unwrap_or_default();

    Ok(ReconcilePlan {
        topology,
        update_paths,
    })
}

/// Converge an existing cluster toward the spec: masked parameter update
/// first, then host/shard topology.
#[instrument(skip(ctx, spec), fields(cluster = %cluster_id))]
pub async fn update_cluster(ctx: &Context, cluster_id: &str, spec: &RedisClusterSpec) -> Result<()> {
    validate_spec(spec)?;
    let observed = read_cluster(ctx, cluster_id, Some(spec)).await?;
    validate_update(&observed.cluster, spec)?;

    with_timeout(ctx.timeouts.update, "updating", cluster_id, async {
        if let Some(req) = build_update_request(&observed.cluster, spec) {
            info!(paths = ?req.update_mask.paths, "updating cluster parameters");
            let op = ctx
                .api
                .update_cluster(&req)
                .await
                .map_err(Error::operation("requesting cluster update", cluster_id))?;
            OperationHandle::new(ctx.api.clone(), op)
                .wait()
                .await
                .map_err(Error::operation("updating cluster", cluster_id))?;
        }

        reconcile_hosts(ctx, cluster_id, spec, &observed.hosts).await
    })
    .await
}

/// Diff and apply host topology for one cluster
async fn reconcile_hosts(
    ctx: &Context,
    cluster_id: &str,
    spec: &RedisClusterSpec,
    current_hosts: &[Host],
) -> Result<()> {
    let desired = expand_hosts(spec);

    let shards = api::list_all_shards(ctx.api.as_ref(), cluster_id)
        .await
        .map_err(Error::operation("listing shards", cluster_id))?;

    let diff = topology::diff_hosts(current_hosts, &desired, spec.sharded);
    if diff.is_empty() {
        debug!("topology already converged");
        return Ok(());
    }

    info!(
        additions = diff.additions(),
        removals = diff.removals(),
        "applying topology changes"
    );
    apply_topology(ctx, cluster_id, &diff, &shards, &desired, spec.sharded).await
}

/// Apply a topology diff: additions first, then removals, strictly in
/// sequence with every operation awaited.
///
/// A new shard (sharding enabled, name absent from `current_shards`) is
/// created with all its hosts in one call followed by a rebalance; hosts
/// joining an existing shard are added one at a time. A shard no desired
/// host references anymore is deleted wholesale; otherwise its surplus
/// hosts are deleted one at a time.
pub async fn apply_topology(
    ctx: &Context,
    cluster_id: &str,
    diff: &TopologyDiff,
    current_shards: &[Shard],
    desired: &[HostSpec],
    sharded: bool,
) -> Result<()> {
    for (shard_name, specs) in &diff.to_add {
        let shard_exists = current_shards.iter().any(|s| s.name == *shard_name);
        if sharded && !shard_exists {
            create_shard(ctx, cluster_id, shard_name, specs).await?;
        } else {
            add_hosts(ctx, cluster_id, specs).await?;
        }
    }

    for (shard_name, fqdns) in &diff.to_delete {
        let still_referenced = desired
            .iter()
            .any(|h| h.shard_name.as_deref() == Some(shard_name.as_str()));
        if sharded && !still_referenced {
            remove_shard(ctx, cluster_id, shard_name).await?;
        } else {
            remove_hosts(ctx, cluster_id, fqdns).await?;
        }
    }

    Ok(())
}

async fn create_shard(
    ctx: &Context,
    cluster_id: &str,
    shard_name: &str,
    specs: &[HostSpec],
) -> Result<()> {
    info!(shard = %shard_name, hosts = specs.len(), "adding shard");
    let op = ctx
        .api
        .add_shard(cluster_id, shard_name, specs)
        .await
        .map_err(Error::operation(
            format!("requesting creation of shard {shard_name}"),
            cluster_id,
        ))?;
    OperationHandle::new(ctx.api.clone(), op)
        .wait()
        .await
        .map_err(Error::operation(
            format!("adding shard {shard_name}"),
            cluster_id,
        ))?;

    let op = ctx
        .api
        .rebalance(cluster_id)
        .await
        .map_err(Error::operation("requesting rebalance", cluster_id))?;
    OperationHandle::new(ctx.api.clone(), op)
        .wait()
        .await
        .map_err(Error::operation("rebalancing", cluster_id))?;

    Ok(())
}

async fn add_hosts(ctx: &Context, cluster_id: &str, specs: &[HostSpec]) -> Result<()> {
    for spec in specs {
        info!(zone = %spec.zone_id, shard = spec.shard_name.as_deref().unwrap_or(""), "adding host");
        let op = ctx
            .api
            .add_hosts(cluster_id, std::slice::from_ref(spec))
            .await
            .map_err(Error::operation(
                format!("requesting host addition in zone {}", spec.zone_id),
                cluster_id,
            ))?;
        OperationHandle::new(ctx.api.clone(), op)
            .wait()
            .await
            .map_err(Error::operation(
                format!("adding host in zone {}", spec.zone_id),
                cluster_id,
            ))?;
    }
    Ok(())
}

async fn remove_shard(ctx: &Context, cluster_id: &str, shard_name: &str) -> Result<()> {
    info!(shard = %shard_name, "deleting shard");
    let op = ctx
        .api
        .delete_shard(cluster_id, shard_name)
        .await
        .map_err(Error::operation(
            format!("requesting deletion of shard {shard_name}"),
            cluster_id,
        ))?;
    OperationHandle::new(ctx.api.clone(), op)
        .wait()
        .await
        .map_err(Error::operation(
            format!("deleting shard {shard_name}"),
            cluster_id,
        ))?;
    Ok(())
}

async fn remove_hosts(ctx: &Context, cluster_id: &str, fqdns: &[String]) -> Result<()> {
    for fqdn in fqdns {
        info!(host = %fqdn, "deleting host");
        let op = ctx
            .api
            .delete_hosts(cluster_id, std::slice::from_ref(fqdn))
            .await
            .map_err(Error::operation(
                format!("requesting deletion of host {fqdn}"),
                cluster_id,
            ))?;
        OperationHandle::new(ctx.api.clone(), op)
            .wait()
            .await
            .map_err(Error::operation(
                format!("deleting host {fqdn}"),
                cluster_id,
            ))?;
    }
    Ok(())
}

/// Delete the cluster and wait for the operation to finish
#[instrument(skip(ctx), fields(cluster = %cluster_id))]
pub async fn delete_cluster(ctx: &Context, cluster_id: &str) -> Result<()> {
    with_timeout(ctx.timeouts.delete, "deleting", cluster_id, async {
        info!("deleting cluster");
        let op = ctx.api.delete_cluster(cluster_id).await.map_err(|e| {
            if e.is_not_found() {
                Error::NotFound(cluster_id.to_string())
            } else {
                Error::operation("requesting cluster deletion", cluster_id)(e)
            }
        })?;
        OperationHandle::new(ctx.api.clone(), op)
            .wait()
            .await
            .map_err(Error::operation("deleting cluster", cluster_id))?;
        info!("cluster deleted");
        Ok(())
    })
    .await
}
