//! Host/shard topology diffing.
//!
//! Compares the host list reported by the service with the desired host
//! list from the spec and produces the add/delete work split by shard.
//! Hosts are compared by zone and subnet, never by fqdn: fqdns are assigned
//! by the service and unknown before a host exists. A desired host that
//! names no subnet matches any subnet in its zone.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::api::types::{Host, HostSpec};

/// Outcome of diffing current against desired topology, keyed by shard name.
///
/// `to_add` holds host specs present in the desired topology but not on the
/// cluster; `to_delete` holds fqdns of hosts the cluster has but the desired
/// topology no longer references. With sharding disabled both maps use a
/// single empty key.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TopologyDiff {
    pub to_add: BTreeMap<String, Vec<HostSpec>>,
    pub to_delete: BTreeMap<String, Vec<String>>,
}

impl TopologyDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of hosts to add across all shards
    pub fn additions(&self) -> usize {
        self.to_add.values().map(Vec::len).sum()
    }

    /// Total number of hosts to remove across all shards
    pub fn removals(&self) -> usize {
        self.to_delete.values().map(Vec::len).sum()
    }
}

fn shard_key(name: &str, sharded: bool) -> String {
    if sharded {
        name.to_string()
    } else {
        String::new()
    }
}

/// Consume the first unclaimed host satisfying `pred`
fn claim(existing: &mut [Option<&Host>], pred: impl Fn(&Host) -> bool) -> bool {
    if let Some(slot) = existing.iter_mut().find(|s| s.map_or(false, &pred)) {
        *slot = None;
        true
    } else {
        false
    }
}

/// Diff current hosts against the desired topology.
///
/// Both lists are partitioned by shard name (ignored when `sharded` is
/// false). Within each shard, desired specs with a subnet claim an exact
/// zone+subnet match first; specs without a subnet then claim any remaining
/// host in their zone. Whatever is left unclaimed on either side becomes
/// `to_add`/`to_delete`.
pub fn diff_hosts(current: &[Host], desired: &[HostSpec], sharded: bool) -> TopologyDiff {
    let mut want: BTreeMap<String, Vec<&HostSpec>> = BTreeMap::new();
    for spec in desired {
        let key = shard_key(spec.shard_name.as_deref().unwrap_or(""), sharded);
        want.entry(key).or_default().push(spec);
    }

    let mut have: BTreeMap<String, Vec<&Host>> = BTreeMap::new();
    for host in current {
        have.entry(shard_key(&host.shard_name, sharded))
            .or_default()
            .push(host);
    }

    let shard_names: BTreeSet<String> = want.keys().chain(have.keys()).cloned().collect();

    let mut diff = TopologyDiff::default();
    for name in shard_names {
        let wanted = want.remove(&name).unwrap_or_default();
        let mut existing: Vec<Option<&Host>> =
            have.remove(&name).unwrap_or_default().into_iter().map(Some).collect();

        let mut missing: Vec<HostSpec> = Vec::new();

        // Subnet-pinned specs claim exact matches first so that a spec
        // without a subnet cannot steal their host.
        let (pinned, floating): (Vec<&HostSpec>, Vec<&HostSpec>) =
            wanted.into_iter().partition(|s| s.subnet_id.is_some());

        for spec in pinned {
            let hit = claim(&mut existing, |h| {
                h.zone_id == spec.zone_id
                    && spec.subnet_id.as_deref() == Some(h.subnet_id.as_str())
            });
            if !hit {
                missing.push(spec.clone());
            }
        }
        for spec in floating {
            if !claim(&mut existing, |h| h.zone_id == spec.zone_id) {
                missing.push(spec.clone());
            }
        }

        if !missing.is_empty() {
            diff.to_add.insert(name.clone(), missing);
        }

        let leftovers: Vec<String> = existing
            .into_iter()
            .flatten()
            .map(|h| h.name.clone())
            .collect();
        if !leftovers.is_empty() {
            diff.to_delete.insert(name, leftovers);
        }
    }

    diff
}

/// Whether a host satisfies a desired spec, for ordering purposes
fn satisfies(host: &Host, spec: &HostSpec) -> bool {
    if host.zone_id != spec.zone_id {
        return false;
    }
    if let Some(subnet) = spec.subnet_id.as_deref() {
        if subnet != host.subnet_id {
            return false;
        }
    }
    if let Some(shard) = spec.shard_name.as_deref() {
        if shard != host.shard_name {
            return false;
        }
    }
    true
}

/// Reorder observed hosts to line up with the desired list so that a pure
/// ordering difference does not register as drift on read.
pub fn sort_hosts(hosts: &mut [Host], desired: &[HostSpec]) {
    let upper = desired.len().min(hosts.len());
    for i in 0..upper {
        for j in i..hosts.len() {
            if satisfies(&hosts[j], &desired[i]) {
                hosts.swap(i, j);
                break;
            }
        }
    }
}
