// src/core/indexing/kdmap/ids.rs

//! Node id minting.

use super::node::NodeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Mints fresh ids for nodes created during insertion.
pub trait NodeIdSource: Send + Sync + fmt::Debug {
    fn mint(&self) -> NodeId;
}

/// `<prefix><uuid v4>` ids, the default for a running service.
#[derive(Debug, Clone)]
pub struct UuidNodeIds {
    prefix: String,
}

impl UuidNodeIds {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        UuidNodeIds { prefix: prefix.into() }
    }
}

impl Default for UuidNodeIds {
    fn default() -> Self {
        UuidNodeIds::new("map-")
    }
}

impl NodeIdSource for UuidNodeIds {
    fn mint(&self) -> NodeId {
        NodeId::new(format!("{}{}", self.prefix, Uuid::new_v4()))
    }
}

/// `<prefix>1`, `<prefix>2`, ... ids. Deterministic, for tests and tooling.
#[derive(Debug)]
pub struct SequentialNodeIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialNodeIds {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        SequentialNodeIds { prefix: prefix.into(), next: AtomicU64::new(1) }
    }
}

impl NodeIdSource for SequentialNodeIds {
    fn mint(&self) -> NodeId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        NodeId::new(format!("{}{}", self.prefix, n))
    }
}
