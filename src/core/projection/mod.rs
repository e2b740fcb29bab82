// src/core/projection/mod.rs

//! Read-only views of the asset map: the bounding-box hierarchy and
//! resolution of client node paths.

pub mod boxes;
pub mod path;

pub use boxes::{
    project_bounding_boxes, BoxConfig, BoxNode, BoxNodeType, ProjectionMode, ASSET_MAP_CONFIG_KEY,
};
pub use path::{path_to, resolve, resolve_path, NodePath, ResolvedPath, Segment, ASSET_MAP_NAMESPACE};
