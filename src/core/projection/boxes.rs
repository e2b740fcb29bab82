// src/core/projection/boxes.rs

//! Bounding-box hierarchy handed to clients so they can report visibility
//! and proximity events keyed by node id.

use crate::core::common::AssetMapError;
use crate::core::geometry::Boundary;
use crate::core::indexing::kdmap::{AssetMap, MapNode, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scene node id the hierarchy is attached under.
pub const ASSET_MAP_CONFIG_KEY: &str = "#assetMap";

/// Requested flavour of the projection. Both modes currently produce the
/// same hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Basic,
    Staging,
}

impl ProjectionMode {
    /// Parses an optional mode string; absent means `Basic`.
    pub fn parse(mode: Option<&str>) -> Result<Self, AssetMapError> {
        mode.map_or(Ok(ProjectionMode::Basic), str::parse::<ProjectionMode>)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ProjectionMode::Basic => "basic",
            ProjectionMode::Staging => "staging",
        }
    }
}

impl FromStr for ProjectionMode {
    type Err = AssetMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ProjectionMode::Basic),
            "staging" => Ok(ProjectionMode::Staging),
            other => Err(AssetMapError::InvalidArgument(format!(
                "mode not supported: '{}' - supported modes are 'basic' and 'staging'",
                other
            ))),
        }
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoxNodeType {
    BoundingBox,
}

/// Identity and extent of one projected node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxConfig {
    pub sid: NodeId,
    #[serde(flatten)]
    pub boundary: Boundary,
}

/// One node of the projected hierarchy; `nodes` mirrors the tree shape,
/// left subtree before right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxNode {
    #[serde(rename = "type")]
    pub kind: BoxNodeType,
    pub cfg: BoxConfig,
    #[serde(default)]
    pub nodes: Vec<BoxNode>,
}

impl BoxNode {
    /// Nodes of this hierarchy in preorder.
    pub fn preorder(&self) -> Vec<&BoxNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.nodes.iter().rev());
        }
        out
    }

    /// Wraps the hierarchy in the scene configuration envelope
    /// `{ "configs": { "#assetMap": { "+node": ... } } }`.
    pub fn into_scene_configs(self) -> Result<serde_json::Value, AssetMapError> {
        let mut attach = serde_json::Map::new();
        attach.insert("+node".to_string(), serde_json::to_value(self)?);
        let mut configs = serde_json::Map::new();
        configs.insert(ASSET_MAP_CONFIG_KEY.to_string(), attach.into());
        let mut envelope = serde_json::Map::new();
        envelope.insert("configs".to_string(), configs.into());
        Ok(envelope.into())
    }
}

/// Projects the whole map, depth-first preorder.
pub fn project_bounding_boxes(map: &AssetMap, mode: ProjectionMode) -> BoxNode {
    tracing::trace!(%mode, nodes = map.node_count(), "projecting bounding boxes");
    project_node(map, map.root())
}

fn project_node(map: &AssetMap, node: &MapNode) -> BoxNode {
    let nodes = [node.left(), node.right()]
        .into_iter()
        .flatten()
        .filter_map(|id| map.node(id))
        .map(|child| project_node(map, child))
        .collect();
    BoxNode {
        kind: BoxNodeType::BoundingBox,
        cfg: BoxConfig { sid: node.id().clone(), boundary: *node.boundary() },
        nodes,
    }
}
