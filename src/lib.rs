pub mod api;
pub mod controller;
pub mod spec;

pub use api::{ApiError, ClusterApi, HttpClusterApi, OperationHandle};
pub use controller::{
    apply_topology, create_cluster, delete_cluster, plan, read_cluster, update_cluster,
    BackoffConfig, Context, Error, ObservedCluster, ReconcilePlan, Result, Timeouts, TopologyDiff,
};
pub use spec::RedisClusterSpec;
