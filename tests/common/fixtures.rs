//! Test fixtures and builders for Redis cluster specs
//!
//! For simple cases use the convenience functions:
//! ```rust,ignore
//! let spec = create_test_spec("cache", &["zone-a", "zone-b"]);
//! let spec = create_sharded_spec("cache", &[("first", "zone-a"), ("second", "zone-b")]);
//! ```
//!
//! For more elaborate configurations use the builder:
//! ```rust,ignore
//! let spec = RedisClusterSpecBuilder::new("cache")
//!     .sharded()
//!     .host("zone-a", Some("first"))
//!     .host("zone-b", Some("second"))
//!     .build();
//! ```

use std::collections::BTreeMap;

use mdb_redis_operator::spec::{
    Environment, HostSpec, MaintenanceWindow, RedisClusterSpec, RedisConfig, RedisVersion,
    Resources,
};

/// Create an unsharded spec with one host per zone
pub fn create_test_spec(name: &str, zones: &[&str]) -> RedisClusterSpec {
    let mut builder = RedisClusterSpecBuilder::new(name);
    for zone in zones {
        builder = builder.host(zone, None);
    }
    builder.build()
}

/// Create a sharded spec with one host per (shard, zone) pair
pub fn create_sharded_spec(name: &str, shards: &[(&str, &str)]) -> RedisClusterSpec {
    let mut builder = RedisClusterSpecBuilder::new(name).sharded();
    for (shard, zone) in shards {
        builder = builder.host(zone, Some(shard));
    }
    builder.build()
}

/// Builder for Redis cluster spec fixtures
pub struct RedisClusterSpecBuilder {
    spec: RedisClusterSpec,
}

impl RedisClusterSpecBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            spec: RedisClusterSpec {
                name: name.to_string(),
                description: String::new(),
                environment: Environment::Production,
                network_id: "net-test".to_string(),
                folder_id: Some("folder-test".to_string()),
                labels: BTreeMap::new(),
                sharded: false,
                tls_enabled: None,
                config: RedisConfig {
                    version: RedisVersion::V6_0,
                    password: "test-password".to_string(),
                    timeout: None,
                    maxmemory_policy: None,
                    notify_keyspace_events: None,
                    slowlog_log_slower_than: None,
                    slowlog_max_len: None,
                    databases: None,
                },
                resources: Resources {
                    resource_preset_id: "hm1.nano".to_string(),
                    disk_size: 16 * 1024 * 1024 * 1024,
                    disk_type_id: None,
                },
                hosts: Vec::new(),
                security_group_ids: Vec::new(),
                maintenance_window: None,
            },
        }
    }

    pub fn sharded(mut self) -> Self {
        self.spec.sharded = true;
        self
    }

    pub fn host(mut self, zone: &str, shard: Option<&str>) -> Self {
        self.spec.hosts.push(HostSpec {
            zone: zone.to_string(),
            shard_name: shard.map(str::to_string),
            subnet_id: None,
            assign_public_ip: false,
        });
        self
    }

    pub fn host_in_subnet(mut self, zone: &str, subnet: &str, shard: Option<&str>) -> Self {
        self.spec.hosts.push(HostSpec {
            zone: zone.to_string(),
            shard_name: shard.map(str::to_string),
            subnet_id: Some(subnet.to_string()),
            assign_public_ip: false,
        });
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.spec.description = description.to_string();
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.spec.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn security_group(mut self, id: &str) -> Self {
        self.spec.security_group_ids.push(id.to_string());
        self
    }

    pub fn timeout(mut self, seconds: i64) -> Self {
        self.spec.config.timeout = Some(seconds);
        self
    }

    pub fn maintenance_window(mut self, mw: MaintenanceWindow) -> Self {
        self.spec.maintenance_window = Some(mw);
        self
    }

    pub fn build(self) -> RedisClusterSpec {
        self.spec
    }
}
