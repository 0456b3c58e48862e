//! HTTP/JSON implementation of [`ClusterApi`].
//!
//! Paths follow the service's REST layout under
//! `/managed-redis/v1/clusters`. Every request carries a bearer token;
//! non-2xx responses are decoded into [`ApiError::Status`] with the
//! service-provided message when present.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::types::*;
use crate::api::ClusterApi;

pub struct HttpClusterApi {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpClusterApi {
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            base_url: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn cluster_url(&self, rest: &str) -> String {
        format!("{}/managed-redis/v1/clusters{}", self.base_url, rest)
    }

    async fn send<T: DeserializeOwned>(&self, rb: RequestBuilder) -> ApiResult<T> {
        let resp = rb.bearer_auth(&self.token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or_default()
                .to_string();
            return Err(ApiError::Status {
                code: status.as_u16(),
                message,
            });
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    async fn get_cluster(&self, cluster_id: &str) -> ApiResult<Cluster> {
        let url = self.cluster_url(&format!("/{cluster_id}"));
        debug!(%cluster_id, "GET cluster");
        self.send(self.http.get(url)).await
    }

    async fn create_cluster(&self, req: &CreateClusterRequest) -> ApiResult<Operation> {
        let url = self.cluster_url("");
        debug!(name = %req.name, "POST create cluster");
        self.send(self.http.post(url).json(req)).await
    }

    async fn update_cluster(&self, req: &UpdateClusterRequest) -> ApiResult<Operation> {
        let url = self.cluster_url(&format!("/{}", req.cluster_id));
        debug!(cluster_id = %req.cluster_id, paths = ?req.update_mask.paths, "PATCH cluster");
        self.send(self.http.patch(url).json(req)).await
    }

    async fn delete_cluster(&self, cluster_id: &str) -> ApiResult<Operation> {
        let url = self.cluster_url(&format!("/{cluster_id}"));
        debug!(%cluster_id, "DELETE cluster");
        self.send(self.http.delete(url)).await
    }

    async fn list_hosts(&self, req: &ListHostsRequest) -> ApiResult<ListHostsResponse> {
        let url = self.cluster_url(&format!("/{}/hosts", req.cluster_id));
        self.send(self.http.get(url).query(&[
            ("pageSize", req.page_size.to_string()),
            ("pageToken", req.page_token.clone()),
        ]))
        .await
    }

    async fn list_shards(&self, req: &ListShardsRequest) -> ApiResult<ListShardsResponse> {
        let url = self.cluster_url(&format!("/{}/shards", req.cluster_id));
        self.send(self.http.get(url).query(&[
            ("pageSize", req.page_size.to_string()),
            ("pageToken", req.page_token.clone()),
        ]))
        .await
    }

    async fn add_hosts(&self, cluster_id: &str, specs: &[HostSpec]) -> ApiResult<Operation> {
        let url = self.cluster_url(&format!("/{cluster_id}/hosts:batchCreate"));
        debug!(%cluster_id, count = specs.len(), "POST add hosts");
        self.send(
            self.http
                .post(url)
                .json(&serde_json::json!({ "hostSpecs": specs })),
        )
        .await
    }

    async fn delete_hosts(&self, cluster_id: &str, fqdns: &[String]) -> ApiResult<Operation> {
        let url = self.cluster_url(&format!("/{cluster_id}/hosts:batchDelete"));
        debug!(%cluster_id, ?fqdns, "POST delete hosts");
        self.send(
            self.http
                .post(url)
                .json(&serde_json::json!({ "hostNames": fqdns })),
        )
        .await
    }

    async fn add_shard(
        &self,
        cluster_id: &str,
        shard_name: &str,
        specs: &[HostSpec],
    ) -> ApiResult<Operation> {
        let url = self.cluster_url(&format!("/{cluster_id}/shards"));
        debug!(%cluster_id, %shard_name, count = specs.len(), "POST add shard");
        self.send(
            self.http
                .post(url)
                .json(&serde_json::json!({ "shardName": shard_name, "hostSpecs": specs })),
        )
        .await
    }

    async fn delete_shard(&self, cluster_id: &str, shard_name: &str) -> ApiResult<Operation> {
        let url = self.cluster_url(&format!("/{cluster_id}/shards/{shard_name}"));
        debug!(%cluster_id, %shard_name, "DELETE shard");
        self.send(self.http.delete(url)).await
    }

    async fn rebalance(&self, cluster_id: &str) -> ApiResult<Operation> {
        let url = self.cluster_url(&format!("/{cluster_id}:rebalance"));
        debug!(%cluster_id, "POST rebalance");
        self.send(self.http.post(url)).await
    }

    async fn get_operation(&self, operation_id: &str) -> ApiResult<Operation> {
        let url = format!("{}/operations/{operation_id}", self.base_url);
        self.send(self.http.get(url)).await
    }
}
