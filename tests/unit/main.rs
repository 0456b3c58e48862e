//! Unit tests for the Redis cluster operator
//!
//! This harness covers:
//! - Topology diffing (host/shard add/delete split)
//! - Spec and update validation
//! - Field-mask construction for parameter updates
//! - Long-running operation polling

#[path = "../common/mod.rs"]
mod common;
