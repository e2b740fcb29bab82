// src/core/indexing/kdmap/mod.rs

//! KD-tree asset map: spatial partition of asset boundaries.

pub use self::document::MapDocument;
pub use self::ids::{NodeIdSource, SequentialNodeIds, UuidNodeIds};
pub use self::node::{Asset, MapNode, NodeId};
pub use self::tree::{AssetMap, Placement, PlacementReason, Preorder, Removal, DEFAULT_MAX_DEPTH};

mod document;
mod ids;
mod node;
mod tree;
