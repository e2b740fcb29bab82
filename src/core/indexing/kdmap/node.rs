// src/core/indexing/kdmap/node.rs

//! Node, node identity and asset types of the asset map.

use crate::core::geometry::{Boundary, HalfSide};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a map node.
///
/// Either the literal root marker or an id minted when the node was
/// created. Never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub const ROOT: &'static str = "root";

    pub fn root() -> Self {
        NodeId(Self::ROOT.to_string())
    }

    pub fn new<S: Into<String>>(id: S) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

/// A placed object: identity plus placement, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub asset_id: String,
    pub boundary: Boundary,
}

impl Asset {
    pub fn new<S: Into<String>>(asset_id: S, boundary: Boundary) -> Self {
        Asset { asset_id: asset_id.into(), boundary }
    }
}

/// One node of the asset map.
///
/// Children are referenced by id; the owning [`AssetMap`](super::AssetMap)
/// stores every node in a single id-keyed arena.
#[derive(Debug, Clone, PartialEq)]
pub struct MapNode {
    id: NodeId,
    boundary: Boundary,
    assets: Vec<Asset>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl MapNode {
    pub fn new(id: NodeId, boundary: Boundary) -> Self {
        MapNode { id, boundary, assets: Vec::new(), left: None, right: None }
    }

    pub(super) fn from_parts(
        id: NodeId,
        boundary: Boundary,
        assets: Vec<Asset>,
        left: Option<NodeId>,
        right: Option<NodeId>,
    ) -> Self {
        MapNode { id, boundary, assets, left, right }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Assets resident at this node, in insertion order.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn left(&self) -> Option<&NodeId> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&NodeId> {
        self.right.as_ref()
    }

    /// The child on `side`: `Lower` is the left child, `Upper` the right.
    pub fn child(&self, side: HalfSide) -> Option<&NodeId> {
        match side {
            HalfSide::Lower => self.left.as_ref(),
            HalfSide::Upper => self.right.as_ref(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn contains_asset(&self, asset_id: &str) -> bool {
        self.assets.iter().any(|a| a.asset_id == asset_id)
    }

    pub(super) fn push_asset(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    /// Removes the first asset with `asset_id`, keeping the order of the rest.
    pub(super) fn take_asset(&mut self, asset_id: &str) -> Option<Asset> {
        let index = self.assets.iter().position(|a| a.asset_id == asset_id)?;
        Some(self.assets.remove(index))
    }

    pub(super) fn set_child(&mut self, side: HalfSide, child: NodeId) {
        match side {
            HalfSide::Lower => self.left = Some(child),
            HalfSide::Upper => self.right = Some(child),
        }
    }
}
