//! In-memory implementation of `ClusterApi` for tests.
//!
//! Applies mutations to an internal cluster model, records every mutating
//! call in issue order, and supports failure injection: the nth mutating
//! call can be rejected synchronously or turned into an operation that
//! fails asynchronously.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use mdb_redis_operator::api::types::*;
use mdb_redis_operator::api::{ApiError, ApiResult, ClusterApi};
use mdb_redis_operator::spec::RedisClusterSpec;

/// One mutating call as seen by the fake service, in issue order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    CreateCluster { name: String },
    UpdateCluster { paths: Vec<String> },
    DeleteCluster,
    AddShard { shard: String, hosts: usize },
    Rebalance,
    AddHosts { zones: Vec<String> },
    DeleteHosts { fqdns: Vec<String> },
    DeleteShard { shard: String },
}

/// How an injected failure manifests
#[derive(Clone, Copy, Debug)]
pub enum FailureMode {
    /// The call itself is rejected with a 500
    Reject,
    /// The call is accepted but its operation completes with an error
    FailOperation,
}

#[derive(Default)]
struct FakeState {
    clusters: BTreeMap<String, Cluster>,
    hosts: BTreeMap<String, Vec<Host>>,
    shards: BTreeMap<String, Vec<Shard>>,
    operations: BTreeMap<String, Operation>,
    calls: Vec<Call>,
    seq: u64,
    fail_at: Option<(usize, FailureMode)>,
    page_size_override: Option<usize>,
    /// Operations that stay pending for N more polls, then succeed or fail
    pending: BTreeMap<String, (usize, bool)>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cluster directly, bypassing call recording, so tests start
    /// from a known observed state
    pub fn seed_cluster(&self, spec: &RedisClusterSpec, folder_id: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let req = CreateClusterRequest {
            folder_id: folder_id.to_string(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            network_id: spec.network_id.clone(),
            environment: spec.environment,
            config_spec: ConfigSpec::from_spec(&spec.config, &spec.resources),
            host_specs: spec.hosts.iter().map(Into::into).collect(),
            labels: spec.labels.clone(),
            sharded: spec.sharded,
            tls_enabled: spec.tls_enabled,
            security_group_ids: spec.security_group_ids.clone(),
        };
        materialize_cluster(&mut state, &req)
    }

    /// Fail the nth mutating call (0-based, counted from now on)
    pub fn fail_mutation(&self, index: usize, mode: FailureMode) {
        let mut state = self.state.lock().unwrap();
        let offset = state.calls.len();
        state.fail_at = Some((offset + index, mode));
    }

    /// Force host/shard listings into pages of at most `n` entries
    pub fn paginate_by(&self, n: usize) {
        self.state.lock().unwrap().page_size_override = Some(n);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn hosts_of(&self, cluster_id: &str) -> Vec<Host> {
        self.state
            .lock()
            .unwrap()
            .hosts
            .get(cluster_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn shard_names_of(&self, cluster_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .shards
            .get(cluster_id)
            .map(|shards| shards.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn cluster_of(&self, cluster_id: &str) -> Option<Cluster> {
        self.state.lock().unwrap().clusters.get(cluster_id).cloned()
    }

    /// Stage an operation that reports not-done for `polls` get_operation
    /// calls and then completes, with an error when `fails` is set.
    /// Returns the initial (pending) operation.
    pub fn stage_pending_operation(&self, id: &str, polls: usize, fails: bool) -> Operation {
        let mut state = self.state.lock().unwrap();
        state.pending.insert(id.to_string(), (polls, fails));
        Operation {
            id: id.to_string(),
            description: String::new(),
            created_at: Some(Utc::now()),
            done: false,
            metadata: None,
            error: None,
            response: None,
        }
    }
}

fn next_id(state: &mut FakeState, prefix: &str) -> String {
    state.seq += 1;
    format!("{prefix}-{}", state.seq)
}

fn done_op(state: &mut FakeState, metadata: Option<serde_json::Value>) -> Operation {
    let id = next_id(state, "op");
    let op = Operation {
        id: id.clone(),
        description: String::new(),
        created_at: Some(Utc::now()),
        done: true,
        metadata,
        error: None,
        response: None,
    };
    state.operations.insert(id, op.clone());
    op
}

fn failed_op(state: &mut FakeState, metadata: Option<serde_json::Value>) -> Operation {
    let id = next_id(state, "op");
    let op = Operation {
        id: id.clone(),
        description: String::new(),
        created_at: Some(Utc::now()),
        done: true,
        metadata,
        error: Some(OperationError {
            code: 13,
            message: "injected operation failure".to_string(),
        }),
        response: None,
    };
    state.operations.insert(id, op.clone());
    op
}

/// Outcome of the failure-injection check for one mutating call
enum Injection {
    Proceed,
    FailOperation,
}

fn record(state: &mut FakeState, call: Call) -> ApiResult<Injection> {
    let index = state.calls.len();
    state.calls.push(call);
    if let Some((at, mode)) = state.fail_at {
        if at == index {
            // One-shot: a rerun after the failure proceeds normally.
            state.fail_at = None;
            return match mode {
                FailureMode::Reject => Err(ApiError::Status {
                    code: 500,
                    message: "injected rejection".to_string(),
                }),
                FailureMode::FailOperation => Ok(Injection::FailOperation),
            };
        }
    }
    Ok(Injection::Proceed)
}

fn assigned_fqdn(state: &mut FakeState, cluster_id: &str, zone: &str) -> String {
    state.seq += 1;
    format!("{cluster_id}-{zone}-{}.db.example.net", state.seq)
}

fn add_host_to_cluster(state: &mut FakeState, cluster_id: &str, spec: &HostSpec, shard: &str) {
    let fqdn = assigned_fqdn(state, cluster_id, &spec.zone_id);
    let host = Host {
        name: fqdn,
        cluster_id: cluster_id.to_string(),
        zone_id: spec.zone_id.clone(),
        subnet_id: spec
            .subnet_id
            .clone()
            .unwrap_or_else(|| format!("auto-subnet-{}", spec.zone_id)),
        shard_name: shard.to_string(),
        assign_public_ip: spec.assign_public_ip,
    };
    state.hosts.entry(cluster_id.to_string()).or_default().push(host);
}

fn ensure_shard(state: &mut FakeState, cluster_id: &str, name: &str) {
    let shards = state.shards.entry(cluster_id.to_string()).or_default();
    if !shards.iter().any(|s| s.name == name) {
        shards.push(Shard {
            name: name.to_string(),
            cluster_id: cluster_id.to_string(),
        });
    }
}

fn materialize_cluster(state: &mut FakeState, req: &CreateClusterRequest) -> String {
    let cluster_id = next_id(state, "c");

    let mut unnamed_shards = 0;
    for spec in &req.host_specs {
        let shard = if req.sharded {
            match spec.shard_name.clone() {
                Some(name) => name,
                None => {
                    unnamed_shards += 1;
                    format!("shard{unnamed_shards}")
                }
            }
        } else {
            "shard1".to_string()
        };
        ensure_shard(state, &cluster_id, &shard);
        add_host_to_cluster(state, &cluster_id, spec, &shard);
    }

    let cluster = Cluster {
        id: cluster_id.clone(),
        folder_id: req.folder_id.clone(),
        name: req.name.clone(),
        description: req.description.clone(),
        network_id: req.network_id.clone(),
        environment: req.environment,
        created_at: Some(Utc::now()),
        sharded: req.sharded,
        tls_enabled: req.tls_enabled.unwrap_or(false),
        health: ClusterHealth::Alive,
        status: ClusterStatus::Running,
        labels: req.labels.clone(),
        config: ClusterConfig {
            version: req.config_spec.version.expect("create carries a version"),
            timeout: req.config_spec.timeout,
            maxmemory_policy: req.config_spec.maxmemory_policy.clone(),
            notify_keyspace_events: req.config_spec.notify_keyspace_events.clone(),
            slowlog_log_slower_than: req.config_spec.slowlog_log_slower_than,
            slowlog_max_len: req.config_spec.slowlog_max_len,
            databases: req.config_spec.databases,
            resources: req
                .config_spec
                .resources
                .clone()
                .expect("create carries resources"),
        },
        security_group_ids: req.security_group_ids.clone(),
        maintenance_window: None,
    };
    state.clusters.insert(cluster_id.clone(), cluster);
    cluster_id
}

fn paged<T: Clone>(items: &[T], page_size: usize, token: &str) -> (Vec<T>, String) {
    let start: usize = token.parse().unwrap_or(0);
    let end = (start + page_size).min(items.len());
    let page = items[start..end].to_vec();
    let next = if end < items.len() {
        end.to_string()
    } else {
        String::new()
    };
    (page, next)
}

#[async_trait]
impl ClusterApi for FakeApi {
    async fn get_cluster(&self, cluster_id: &str) -> ApiResult<Cluster> {
        let state = self.state.lock().unwrap();
        state
            .clusters
            .get(cluster_id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                code: 404,
                message: format!("cluster {cluster_id} not found"),
            })
    }

    async fn create_cluster(&self, req: &CreateClusterRequest) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        let injection = record(
            &mut state,
            Call::CreateCluster {
                name: req.name.clone(),
            },
        )?;
        if let Injection::FailOperation = injection {
            let op = failed_op(&mut state, None);
            return Ok(op);
        }
        let cluster_id = materialize_cluster(&mut state, req);
        let op = done_op(
            &mut state,
            Some(serde_json::json!({ "clusterId": cluster_id })),
        );
        Ok(op)
    }

    async fn update_cluster(&self, req: &UpdateClusterRequest) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        let injection = record(
            &mut state,
            Call::UpdateCluster {
                paths: req.update_mask.paths.clone(),
            },
        )?;
        if let Injection::FailOperation = injection {
            return Ok(failed_op(&mut state, None));
        }

        let Some(cluster) = state.clusters.get_mut(&req.cluster_id) else {
            return Err(ApiError::Status {
                code: 404,
                message: format!("cluster {} not found", req.cluster_id),
            });
        };
        if req.update_mask.contains("name") {
            if let Some(name) = &req.name {
                cluster.name = name.clone();
            }
        }
        if req.update_mask.contains("description") {
            if let Some(description) = &req.description {
                cluster.description = description.clone();
            }
        }
        if req.update_mask.contains("labels") {
            cluster.labels = req.labels.clone();
        }
        if req.update_mask.contains("security_group_ids") {
            cluster.security_group_ids = req.security_group_ids.clone();
        }
        if req.update_mask.contains("maintenance_window") {
            cluster.maintenance_window = req.maintenance_window.clone();
        }
        if let Some(config_spec) = &req.config_spec {
            if req.update_mask.contains("config_spec.resources") {
                if let Some(resources) = &config_spec.resources {
                    cluster.config.resources = resources.clone();
                }
            }
            if req.update_mask.contains("config_spec.redis_config_5_0")
                || req.update_mask.contains("config_spec.redis_config_6_0")
            {
                cluster.config.timeout = config_spec.timeout;
                cluster.config.maxmemory_policy = config_spec.maxmemory_policy.clone();
                cluster.config.notify_keyspace_events =
                    config_spec.notify_keyspace_events.clone();
                cluster.config.slowlog_log_slower_than = config_spec.slowlog_log_slower_than;
                cluster.config.slowlog_max_len = config_spec.slowlog_max_len;
                cluster.config.databases = config_spec.databases;
            }
        }
        let op = done_op(&mut state, None);
        Ok(op)
    }

    async fn delete_cluster(&self, cluster_id: &str) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        if !state.clusters.contains_key(cluster_id) {
            return Err(ApiError::Status {
                code: 404,
                message: format!("cluster {cluster_id} not found"),
            });
        }
        let injection = record(&mut state, Call::DeleteCluster)?;
        if let Injection::FailOperation = injection {
            return Ok(failed_op(&mut state, None));
        }
        state.clusters.remove(cluster_id);
        state.hosts.remove(cluster_id);
        state.shards.remove(cluster_id);
        let op = done_op(&mut state, None);
        Ok(op)
    }

    async fn list_hosts(&self, req: &ListHostsRequest) -> ApiResult<ListHostsResponse> {
        let state = self.state.lock().unwrap();
        let hosts = state.hosts.get(&req.cluster_id).cloned().unwrap_or_default();
        let page_size = state
            .page_size_override
            .unwrap_or(req.page_size.max(1) as usize);
        let (page, next) = paged(&hosts, page_size, &req.page_token);
        Ok(ListHostsResponse {
            hosts: page,
            next_page_token: next,
        })
    }

    async fn list_shards(&self, req: &ListShardsRequest) -> ApiResult<ListShardsResponse> {
        let state = self.state.lock().unwrap();
        let shards = state.shards.get(&req.cluster_id).cloned().unwrap_or_default();
        let page_size = state
            .page_size_override
            .unwrap_or(req.page_size.max(1) as usize);
        let (page, next) = paged(&shards, page_size, &req.page_token);
        Ok(ListShardsResponse {
            shards: page,
            next_page_token: next,
        })
    }

    async fn add_hosts(&self, cluster_id: &str, specs: &[HostSpec]) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        let injection = record(
            &mut state,
            Call::AddHosts {
                zones: specs.iter().map(|s| s.zone_id.clone()).collect(),
            },
        )?;
        if let Injection::FailOperation = injection {
            return Ok(failed_op(&mut state, None));
        }
        for spec in specs {
            let shard = spec
                .shard_name
                .clone()
                .unwrap_or_else(|| "shard1".to_string());
            ensure_shard(&mut state, cluster_id, &shard);
            add_host_to_cluster(&mut state, cluster_id, spec, &shard);
        }
        let op = done_op(&mut state, None);
        Ok(op)
    }

    async fn delete_hosts(&self, cluster_id: &str, fqdns: &[String]) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        let injection = record(
            &mut state,
            Call::DeleteHosts {
                fqdns: fqdns.to_vec(),
            },
        )?;
        if let Injection::FailOperation = injection {
            return Ok(failed_op(&mut state, None));
        }
        if let Some(hosts) = state.hosts.get_mut(cluster_id) {
            hosts.retain(|h| !fqdns.contains(&h.name));
        }
        let op = done_op(&mut state, None);
        Ok(op)
    }

    async fn add_shard(
        &self,
        cluster_id: &str,
        shard_name: &str,
        specs: &[HostSpec],
    ) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        let injection = record(
            &mut state,
            Call::AddShard {
                shard: shard_name.to_string(),
                hosts: specs.len(),
            },
        )?;
        if let Injection::FailOperation = injection {
            return Ok(failed_op(&mut state, None));
        }
        ensure_shard(&mut state, cluster_id, shard_name);
        for spec in specs {
            add_host_to_cluster(&mut state, cluster_id, spec, shard_name);
        }
        let op = done_op(&mut state, None);
        Ok(op)
    }

    async fn delete_shard(&self, cluster_id: &str, shard_name: &str) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        let injection = record(
            &mut state,
            Call::DeleteShard {
                shard: shard_name.to_string(),
            },
        )?;
        if let Injection::FailOperation = injection {
            return Ok(failed_op(&mut state, None));
        }
        if let Some(shards) = state.shards.get_mut(cluster_id) {
            shards.retain(|s| s.name != shard_name);
        }
        if let Some(hosts) = state.hosts.get_mut(cluster_id) {
            hosts.retain(|h| h.shard_name != shard_name);
        }
        let op = done_op(&mut state, None);
        Ok(op)
    }

    async fn rebalance(&self, cluster_id: &str) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        if !state.clusters.contains_key(cluster_id) {
            return Err(ApiError::Status {
                code: 404,
                message: format!("cluster {cluster_id} not found"),
            });
        }
        let injection = record(&mut state, Call::Rebalance)?;
        if let Injection::FailOperation = injection {
            return Ok(failed_op(&mut state, None));
        }
        let op = done_op(&mut state, None);
        Ok(op)
    }

    async fn get_operation(&self, operation_id: &str) -> ApiResult<Operation> {
        let mut state = self.state.lock().unwrap();
        if let Some((polls, fails)) = state.pending.get_mut(operation_id) {
            if *polls > 1 {
                *polls -= 1;
                return Ok(Operation {
                    id: operation_id.to_string(),
                    description: String::new(),
                    created_at: Some(Utc::now()),
                    done: false,
                    metadata: None,
                    error: None,
                    response: None,
                });
            }
            let fails = *fails;
            state.pending.remove(operation_id);
            return Ok(Operation {
                id: operation_id.to_string(),
                description: String::new(),
                created_at: Some(Utc::now()),
                done: true,
                metadata: None,
                error: fails.then(|| OperationError {
                    code: 13,
                    message: "injected operation failure".to_string(),
                }),
                response: None,
            });
        }
        state
            .operations
            .get(operation_id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                code: 404,
                message: format!("operation {operation_id} not found"),
            })
    }
}
