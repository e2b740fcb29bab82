// src/core/indexing/kdmap/tree.rs

//! The asset map itself: an id-keyed arena of [`MapNode`]s forming an
//! axis-cycling kd-tree, with insertion and removal.

use super::ids::NodeIdSource;
use super::node::{Asset, MapNode, NodeId};
use crate::core::common::AssetMapError;
use crate::core::geometry::{Axis, Boundary, HalfSide, Intersection};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Depth at which descent stops and the asset is kept at the current node.
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Attempts at minting an id that is not already in the arena.
const MINT_ATTEMPTS: usize = 8;

/// Why descent stopped at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementReason {
    /// The asset straddles this node's split plane.
    Straddle,
    /// The maximum depth was reached.
    DepthLimit,
}

/// The node a descent stopped at, and how deep it was (root = 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub node: NodeId,
    pub depth: usize,
    pub reason: PlacementReason,
}

/// Outcome of [`AssetMap::remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    Removed { node: NodeId, asset: Asset },
    NotFound,
}

/// One step of the descent rule shared by insert, remove and locate.
enum Step {
    Here,
    Child(HalfSide, Boundary),
}

/// Inside the lower half goes left, straddling stays, anything else goes right.
fn choose_step(node_boundary: &Boundary, axis: Axis, target: &Boundary) -> Step {
    let lower = node_boundary.half(axis, HalfSide::Lower);
    match target.classify(&lower) {
        Intersection::Inside => Step::Child(HalfSide::Lower, lower),
        Intersection::Partial => Step::Here,
        Intersection::Outside => {
            Step::Child(HalfSide::Upper, node_boundary.half(axis, HalfSide::Upper))
        }
    }
}

/// An axis-cycling kd-tree over asset boundaries.
///
/// The root splits on x, its children on y, then z, and so on. Nodes are
/// created lazily on first need and never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMap {
    root: NodeId,
    nodes: HashMap<NodeId, MapNode>,
    max_depth: usize,
}

impl AssetMap {
    /// A map holding only an empty root node governing `root_boundary`.
    pub fn new(root_boundary: Boundary, max_depth: usize) -> Self {
        let root = NodeId::root();
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), MapNode::new(root.clone(), root_boundary));
        AssetMap { root, nodes, max_depth: max_depth.max(1) }
    }

    /// Assembles a map from an already-populated arena.
    pub(super) fn from_arena(
        root: NodeId,
        nodes: HashMap<NodeId, MapNode>,
        max_depth: usize,
    ) -> Result<Self, AssetMapError> {
        if !nodes.contains_key(&root) {
            return Err(AssetMapError::CorruptDocument(format!("root node '{}' missing", root)));
        }
        Ok(AssetMap { root, nodes, max_depth: max_depth.max(1) })
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn root(&self) -> &MapNode {
        // The constructors guarantee the root is in the arena.
        &self.nodes[&self.root]
    }

    pub fn node(&self, id: &NodeId) -> Option<&MapNode> {
        self.nodes.get(id)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn asset_count(&self) -> usize {
        self.nodes.values().map(|n| n.assets().len()).sum()
    }

    /// Nodes in depth-first preorder: node, left subtree, right subtree.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { map: self, stack: vec![&self.root] }
    }

    /// Inserts `asset`, creating child nodes with ids from `ids` as needed.
    ///
    /// # Errors
    /// `InvalidBoundary` for a malformed box, `OutsideBoundary` when the box
    /// does not touch the root at all. Neither mutates the map.
    pub fn insert(
        &mut self,
        asset: Asset,
        ids: &dyn NodeIdSource,
    ) -> Result<Placement, AssetMapError> {
        asset.boundary.validate()?;
        if asset.boundary.classify(self.root().boundary()) == Intersection::Outside {
            return Err(AssetMapError::OutsideBoundary { asset_id: asset.asset_id });
        }

        let mut current = self.root.clone();
        let mut axis = Axis::X;
        let mut depth = 0;
        loop {
            depth += 1;
            let node_boundary = *self.node_or_corrupt(&current)?.boundary();
            trace!(node = %current, ?axis, depth, "insert descent");

            if depth >= self.max_depth {
                debug!(asset = %asset.asset_id, node = %current, "max depth reached, placing in current node");
                return Ok(self.place(current, depth, PlacementReason::DepthLimit, asset));
            }

            match choose_step(&node_boundary, axis, &asset.boundary) {
                Step::Here => {
                    return Ok(self.place(current, depth, PlacementReason::Straddle, asset));
                }
                Step::Child(side, child_boundary) => {
                    let existing = self.node_or_corrupt(&current)?.child(side).cloned();
                    current = match existing {
                        Some(child) => child,
                        None => self.create_child(&current, side, child_boundary, ids)?,
                    };
                    axis = axis.next();
                }
            }
        }
    }

    /// Finds the node that insertion would choose for `boundary` without
    /// creating anything. `None` when that node does not exist yet.
    pub fn locate(&self, boundary: &Boundary) -> Option<Placement> {
        let mut current = &self.root;
        let mut axis = Axis::X;
        let mut depth = 0;
        loop {
            depth += 1;
            let node = self.nodes.get(current)?;
            if depth >= self.max_depth {
                return Some(Placement {
                    node: current.clone(),
                    depth,
                    reason: PlacementReason::DepthLimit,
                });
            }
            match choose_step(node.boundary(), axis, boundary) {
                Step::Here => {
                    return Some(Placement {
                        node: current.clone(),
                        depth,
                        reason: PlacementReason::Straddle,
                    });
                }
                Step::Child(side, _) => {
                    current = node.child(side)?;
                    axis = axis.next();
                }
            }
        }
    }

    /// Removes the asset `asset_id` from the node insertion would have put
    /// `boundary` in. Emptied nodes stay in place.
    ///
    /// # Errors
    /// `InvalidBoundary` for a malformed box, `OutsideBoundary` when the box
    /// is not entirely inside the root.
    pub fn remove(
        &mut self,
        asset_id: &str,
        boundary: &Boundary,
    ) -> Result<Removal, AssetMapError> {
        boundary.validate()?;
        if boundary.classify(self.root().boundary()) != Intersection::Inside {
            return Err(AssetMapError::OutsideBoundary { asset_id: asset_id.to_string() });
        }

        let Some(placement) = self.locate(boundary) else {
            debug!(asset = asset_id, "remove: descent reached a missing child");
            return Ok(Removal::NotFound);
        };
        let node = self
            .nodes
            .get_mut(&placement.node)
            .ok_or_else(|| AssetMapError::Internal(format!("located node '{}' vanished", placement.node)))?;

        Ok(match node.take_asset(asset_id) {
            Some(asset) => Removal::Removed { node: placement.node, asset },
            None => Removal::NotFound,
        })
    }

    fn node_or_corrupt(&self, id: &NodeId) -> Result<&MapNode, AssetMapError> {
        self.nodes
            .get(id)
            .ok_or_else(|| AssetMapError::CorruptDocument(format!("dangling child id '{}'", id)))
    }

    fn place(
        &mut self,
        node_id: NodeId,
        depth: usize,
        reason: PlacementReason,
        asset: Asset,
    ) -> Placement {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.push_asset(asset);
        }
        Placement { node: node_id, depth, reason }
    }

    fn create_child(
        &mut self,
        parent: &NodeId,
        side: HalfSide,
        boundary: Boundary,
        ids: &dyn NodeIdSource,
    ) -> Result<NodeId, AssetMapError> {
        let id = (0..MINT_ATTEMPTS)
            .map(|_| ids.mint())
            .find(|id| !self.nodes.contains_key(id))
            .ok_or_else(|| {
                AssetMapError::Internal(format!("could not mint a unique node id under '{}'", parent))
            })?;

        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| AssetMapError::CorruptDocument(format!("dangling child id '{}'", parent)))?;
        parent_node.set_child(side, id.clone());
        self.nodes.insert(id.clone(), MapNode::new(id.clone(), boundary));
        trace!(parent = %parent, child = %id, ?side, "created child node");
        Ok(id)
    }
}

/// Preorder traversal over an [`AssetMap`].
#[derive(Debug)]
pub struct Preorder<'a> {
    map: &'a AssetMap,
    stack: Vec<&'a NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a MapNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.map.nodes.get(id) {
                if let Some(right) = node.right() {
                    self.stack.push(right);
                }
                if let Some(left) = node.left() {
                    self.stack.push(left);
                }
                return Some(node);
            }
        }
        None
    }
}
