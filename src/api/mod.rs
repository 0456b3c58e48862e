//! Remote managed-database API surface.
//!
//! The service is an opaque collaborator: cluster CRUD, host/shard listing
//! and mutation, rebalance, all returning pollable long-running operations.
//! [`ClusterApi`] abstracts it so the controller can run against the real
//! HTTP endpoint or an in-memory fake in tests.

pub mod error;
pub mod http;
pub mod operation;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use http::HttpClusterApi;
pub use operation::OperationHandle;
pub use types::*;

use async_trait::async_trait;

/// Operations the managed Redis service exposes per cluster.
///
/// Every mutating call returns an [`Operation`] that must be driven to
/// completion with [`OperationHandle::wait`] before the next structural
/// change is issued; the service serializes changes per cluster.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn get_cluster(&self, cluster_id: &str) -> ApiResult<Cluster>;

    async fn create_cluster(&self, req: &CreateClusterRequest) -> ApiResult<Operation>;

    async fn update_cluster(&self, req: &UpdateClusterRequest) -> ApiResult<Operation>;

    async fn delete_cluster(&self, cluster_id: &str) -> ApiResult<Operation>;

    async fn list_hosts(&self, req: &ListHostsRequest) -> ApiResult<ListHostsResponse>;

    async fn list_shards(&self, req: &ListShardsRequest) -> ApiResult<ListShardsResponse>;

    async fn add_hosts(&self, cluster_id: &str, specs: &[HostSpec]) -> ApiResult<Operation>;

    async fn delete_hosts(&self, cluster_id: &str, fqdns: &[String]) -> ApiResult<Operation>;

    async fn add_shard(
        &self,
        cluster_id: &str,
        shard_name: &str,
        specs: &[HostSpec],
    ) -> ApiResult<Operation>;

    async fn delete_shard(&self, cluster_id: &str, shard_name: &str) -> ApiResult<Operation>;

    async fn rebalance(&self, cluster_id: &str) -> ApiResult<Operation>;

    async fn get_operation(&self, operation_id: &str) -> ApiResult<Operation>;
}

/// Drain the paginated host listing of a cluster
pub async fn list_all_hosts(api: &dyn ClusterApi, cluster_id: &str) -> ApiResult<Vec<Host>> {
    let mut hosts = Vec::new();
    let mut page_token = String::new();
    loop {
        let resp = api
            .list_hosts(&ListHostsRequest {
                cluster_id: cluster_id.to_string(),
                page_size: DEFAULT_PAGE_SIZE,
                page_token: page_token.clone(),
            })
            .await?;
        hosts.extend(resp.hosts);
        if resp.next_page_token.is_empty() {
            break;
        }
        page_token = resp.next_page_token;
    }
    Ok(hosts)
}

/// Drain the paginated shard listing of a cluster
pub async fn list_all_shards(api: &dyn ClusterApi, cluster_id: &str) -> ApiResult<Vec<Shard>> {
    let mut shards = Vec::new();
    let mut page_token = String::new();
    loop {
        let resp = api
            .list_shards(&ListShardsRequest {
                cluster_id: cluster_id.to_string(),
                page_size: DEFAULT_PAGE_SIZE,
                page_token: page_token.clone(),
            })
            .await?;
        shards.extend(resp.shards);
        if resp.next_page_token.is_empty() {
            break;
        }
        page_token = resp.next_page_token;
    }
    Ok(shards)
}
