//! Long-running operation handling.
//!
//! Every mutating API call returns an [`Operation`] that completes
//! asynchronously on the server. [`OperationHandle`] polls it to completion
//! and distinguishes synchronous rejection (the call itself failed) from
//! asynchronous failure (the operation finished with an error).

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::types::Operation;
use crate::api::ClusterApi;

/// Default interval between completion polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Drives one [`Operation`] to completion.
pub struct OperationHandle {
    api: Arc<dyn ClusterApi>,
    op: Operation,
    poll_interval: Duration,
}

impl OperationHandle {
    pub fn new(api: Arc<dyn ClusterApi>, op: Operation) -> Self {
        Self::with_poll_interval(api, op, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(api: Arc<dyn ClusterApi>, op: Operation, poll_interval: Duration) -> Self {
        Self {
            api,
            op,
            poll_interval,
        }
    }

    pub fn id(&self) -> &str {
        &self.op.id
    }

    /// Operation metadata as returned at submission time
    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.op.metadata.as_ref()
    }

    /// Cluster id carried in create-operation metadata
    pub fn cluster_id_from_metadata(&self) -> ApiResult<String> {
        self.op
            .cluster_id_from_metadata()
            .ok_or_else(|| ApiError::MissingMetadata(self.op.id.clone()))
    }

    /// Poll until the operation is done.
    ///
    /// Returns the final operation on success; an operation that finished
    /// with an error surfaces as [`ApiError::OperationFailed`]. Cancellation
    /// comes from the caller's timeout, not from here.
    pub async fn wait(mut self) -> ApiResult<Operation> {
        loop {
            if self.op.done {
                if let Some(err) = self.op.error.take() {
                    return Err(ApiError::OperationFailed {
                        id: self.op.id,
                        code: err.code,
                        message: err.message,
                    });
                }
                debug!(operation = %self.op.id, "operation completed");
                return Ok(self.op);
            }
            tokio::time::sleep(self.poll_interval).await;
            self.op = self.api.get_operation(&self.op.id).await?;
        }
    }
}
