// src/event_engine/handler/delivery.rs

use crate::core::indexing::kdmap::MapNode;
use std::fmt;

/// Supplies the assets to push to a client for a node it is approaching.
pub trait AssetDelivery: Send + Sync + fmt::Debug {
    /// Zero or more asset payloads for `node`.
    fn assets_for(&self, node: &MapNode) -> anyhow::Result<Vec<serde_json::Value>>;
}

/// Delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelivery;

impl AssetDelivery for NoDelivery {
    fn assets_for(&self, _node: &MapNode) -> anyhow::Result<Vec<serde_json::Value>> {
        Ok(Vec::new())
    }
}

/// Delivers the assets resident at the node as `{assetId, boundary}` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidentAssetDelivery;

impl AssetDelivery for ResidentAssetDelivery {
    fn assets_for(&self, node: &MapNode) -> anyhow::Result<Vec<serde_json::Value>> {
        node.assets()
            .iter()
            .map(|asset| serde_json::to_value(asset).map_err(anyhow::Error::from))
            .collect()
    }
}
