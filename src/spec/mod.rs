mod redis_cluster;

pub use redis_cluster::*;
