// src/core/projection/path.rs

//! Client-reported node paths and their resolution against the map.

use crate::core::geometry::HalfSide;
use crate::core::indexing::kdmap::{AssetMap, MapNode, NodeId};
use std::fmt;

/// First segment of every node URI; names the scene node the box hierarchy
/// hangs from and is not part of the tree path.
pub const ASSET_MAP_NAMESPACE: &str = "assetMap";

/// One step of a node path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// `"a"`: the left child.
    Left,
    /// `"b"`: the right child.
    Right,
    /// Whichever child carries this id.
    Node(NodeId),
}

impl Segment {
    pub fn parse(segment: &str) -> Self {
        match segment {
            "a" => Segment::Left,
            "b" => Segment::Right,
            id => Segment::Node(NodeId::new(id)),
        }
    }

    pub fn from_side(side: HalfSide) -> Self {
        match side {
            HalfSide::Lower => Segment::Left,
            HalfSide::Upper => Segment::Right,
        }
    }

    /// The child of `node` this segment selects, and on which side.
    fn select<'a>(&self, node: &'a MapNode) -> Option<(HalfSide, &'a NodeId)> {
        match self {
            Segment::Left => node.left().map(|id| (HalfSide::Lower, id)),
            Segment::Right => node.right().map(|id| (HalfSide::Upper, id)),
            Segment::Node(wanted) => [HalfSide::Lower, HalfSide::Upper]
                .into_iter()
                .find_map(|side| node.child(side).filter(|id| *id == wanted).map(|id| (side, id))),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Left => f.write_str("a"),
            Segment::Right => f.write_str("b"),
            Segment::Node(id) => write!(f, "{}", id),
        }
    }
}

/// A path from the root, one segment per level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath {
    segments: Vec<Segment>,
}

impl NodePath {
    pub fn new(segments: Vec<Segment>) -> Self {
        NodePath { segments }
    }

    /// Parses a slash-separated node URI. The first segment is the namespace
    /// marker and is skipped; empty segments are ignored.
    pub fn from_uri(uri: &str) -> Self {
        let segments = uri
            .split('/')
            .skip(1)
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect();
        NodePath { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The URI form, `assetMap/a/b/...`.
    pub fn to_uri(&self) -> String {
        let mut uri = ASSET_MAP_NAMESPACE.to_string();
        for segment in &self.segments {
            uri.push('/');
            uri.push_str(&segment.to_string());
        }
        uri
    }
}

/// Where a path led: each step taken from the root, with its side.
#[derive(Debug, Clone)]
pub struct ResolvedPath<'a> {
    root: &'a MapNode,
    steps: Vec<(HalfSide, &'a MapNode)>,
}

impl<'a> ResolvedPath<'a> {
    /// The node the path ends at.
    pub fn node(&self) -> &'a MapNode {
        self.steps.last().map_or(self.root, |(_, node)| node)
    }

    pub fn steps(&self) -> &[(HalfSide, &'a MapNode)] {
        &self.steps
    }
}

/// Follows `path` from the root. `None` as soon as a referenced child does
/// not exist; the empty path resolves to the root.
pub fn resolve<'a>(map: &'a AssetMap, path: &NodePath) -> Option<ResolvedPath<'a>> {
    let root = map.root();
    let mut current = root;
    let mut steps = Vec::with_capacity(path.len());
    for segment in path.segments() {
        let (side, id) = segment.select(current)?;
        current = map.node(id)?;
        steps.push((side, current));
    }
    Some(ResolvedPath { root, steps })
}

/// The node `path` leads to, if it exists.
pub fn resolve_path<'a>(map: &'a AssetMap, path: &NodePath) -> Option<&'a MapNode> {
    resolve(map, path).map(|resolved| resolved.node())
}

/// The `a`/`b` path from the root to the node `target`, if present.
pub fn path_to(map: &AssetMap, target: &NodeId) -> Option<NodePath> {
    let mut stack = vec![(map.root(), Vec::new())];
    while let Some((node, segments)) = stack.pop() {
        if node.id() == target {
            return Some(NodePath::new(segments));
        }
        for side in [HalfSide::Upper, HalfSide::Lower] {
            if let Some(child) = node.child(side).and_then(|id| map.node(id)) {
                let mut next = segments.clone();
                next.push(Segment::from_side(side));
                stack.push((child, next));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Boundary;
    use crate::core::indexing::kdmap::{Asset, SequentialNodeIds};

    /// root -> a (n1, x<0) -> b (n2, y>0)
    fn sample_map() -> AssetMap {
        let ids = SequentialNodeIds::new("n");
        let mut map = AssetMap::new(Boundary::cube(100.0), 500);
        map.insert(Asset::new("deep", Boundary::new(-60.0, 10.0, -40.0, -40.0, 20.0, 40.0)), &ids)
            .unwrap();
        map
    }

    #[test]
    fn test_uri_parsing_skips_namespace() {
        let path = NodePath::from_uri("assetMap/a/b");
        assert_eq!(path.segments(), &[Segment::Left, Segment::Right]);
        assert_eq!(path.to_uri(), "assetMap/a/b");
        assert!(NodePath::from_uri("assetMap").is_empty());
        assert!(NodePath::from_uri("").is_empty());
        assert_eq!(NodePath::from_uri("assetMap//a/").len(), 1);
    }

    #[test]
    fn test_resolves_selectors_and_ids() {
        let map = sample_map();
        let node = resolve_path(&map, &NodePath::from_uri("assetMap/a/b")).unwrap();
        assert_eq!(node.id().as_str(), "n2");
        assert_eq!(node.assets()[0].asset_id, "deep");

        let by_id = resolve_path(&map, &NodePath::from_uri("assetMap/n1/n2")).unwrap();
        assert_eq!(by_id.id(), node.id());

        let resolved = resolve(&map, &NodePath::from_uri("assetMap/a/b")).unwrap();
        let sides: Vec<HalfSide> = resolved.steps().iter().map(|(side, _)| *side).collect();
        assert_eq!(sides, vec![HalfSide::Lower, HalfSide::Upper]);
    }

    #[test]
    fn test_empty_path_is_root() {
        let map = sample_map();
        assert!(resolve_path(&map, &NodePath::default()).unwrap().id().is_root());
    }

    #[test]
    fn test_missing_child_is_not_found() {
        let map = sample_map();
        assert!(resolve_path(&map, &NodePath::from_uri("assetMap/b")).is_none());
        assert!(resolve_path(&map, &NodePath::from_uri("assetMap/a/a")).is_none());
        assert!(resolve_path(&map, &NodePath::from_uri("assetMap/a/b/a")).is_none());
        assert!(resolve_path(&map, &NodePath::from_uri("assetMap/n2")).is_none());
    }

    #[test]
    fn test_path_to_round_trips_through_resolve() {
        let map = sample_map();
        let path = path_to(&map, &NodeId::new("n2")).unwrap();
        assert_eq!(path.to_uri(), "assetMap/a/b");
        assert_eq!(resolve_path(&map, &path).unwrap().id().as_str(), "n2");
        assert!(path_to(&map, &NodeId::new("missing")).is_none());
        assert!(path_to(&map, &NodeId::root()).unwrap().is_empty());
    }
}
