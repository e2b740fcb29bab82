// src/core/indexing/kdmap/document.rs

//! Nested document form of the asset map, as persisted and as returned by
//! `getAssetMap`. The id-keyed arena is rebuilt from it on load.

use super::node::{Asset, MapNode, NodeId};
use super::tree::AssetMap;
use crate::core::common::AssetMapError;
use crate::core::geometry::Boundary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    pub id: NodeId,
    pub boundary: Boundary,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_child: Option<Box<MapDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_child: Option<Box<MapDocument>>,
}

impl MapDocument {
    /// Snapshot of `map` starting at its root.
    pub fn from_map(map: &AssetMap) -> Self {
        Self::from_node(map, map.root())
    }

    fn from_node(map: &AssetMap, node: &MapNode) -> Self {
        let child = |id: Option<&NodeId>| {
            id.and_then(|id| map.node(id)).map(|n| Box::new(Self::from_node(map, n)))
        };
        MapDocument {
            id: node.id().clone(),
            boundary: *node.boundary(),
            assets: node.assets().to_vec(),
            left_child: child(node.left()),
            right_child: child(node.right()),
        }
    }

    /// Rebuilds the arena form. Every node must carry a valid boundary and
    /// a unique id.
    pub fn into_map(self, max_depth: usize) -> Result<AssetMap, AssetMapError> {
        let root = self.id.clone();
        let mut nodes = HashMap::new();
        flatten(self, &mut nodes)?;
        AssetMap::from_arena(root, nodes, max_depth)
    }

    /// Number of nodes in this (sub)document.
    pub fn node_count(&self) -> usize {
        1 + self.left_child.as_ref().map_or(0, |c| c.node_count())
            + self.right_child.as_ref().map_or(0, |c| c.node_count())
    }
}

fn flatten(doc: MapDocument, nodes: &mut HashMap<NodeId, MapNode>) -> Result<(), AssetMapError> {
    if !doc.boundary.is_valid() {
        return Err(AssetMapError::CorruptDocument(format!(
            "node '{}' has invalid boundary {}",
            doc.id, doc.boundary
        )));
    }
    if nodes.contains_key(&doc.id) {
        return Err(AssetMapError::CorruptDocument(format!("duplicate node id '{}'", doc.id)));
    }

    let left = doc.left_child.as_ref().map(|c| c.id.clone());
    let right = doc.right_child.as_ref().map(|c| c.id.clone());
    let node = MapNode::from_parts(doc.id.clone(), doc.boundary, doc.assets, left, right);
    nodes.insert(doc.id, node);

    if let Some(child) = doc.left_child {
        flatten(*child, nodes)?;
    }
    if let Some(child) = doc.right_child {
        flatten(*child, nodes)?;
    }
    Ok(())
}
