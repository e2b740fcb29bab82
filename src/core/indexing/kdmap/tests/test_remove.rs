// src/core/indexing/kdmap/tests/test_remove.rs

use crate::core::common::AssetMapError;
use crate::core::geometry::Boundary;
use crate::core::indexing::kdmap::{
    Asset, AssetMap, MapDocument, NodeId, Removal, SequentialNodeIds, DEFAULT_MAX_DEPTH,
};

fn empty_map() -> AssetMap {
    AssetMap::new(Boundary::cube(100_000.0), DEFAULT_MAX_DEPTH)
}

fn left_straddler() -> Boundary {
    Boundary::new(-20.0, -5.0, -5.0, -10.0, 5.0, 5.0)
}

#[test]
fn test_remove_inserted_asset_leaves_empty_node_in_place() {
    let mut map = empty_map();
    let ids = SequentialNodeIds::new("n");
    map.insert(Asset::new("A1", left_straddler()), &ids).unwrap();

    let removal = map.remove("A1", &left_straddler()).unwrap();

    match removal {
        Removal::Removed { node, asset } => {
            assert_eq!(node, NodeId::from("n1"));
            assert_eq!(asset.asset_id, "A1");
        }
        Removal::NotFound => panic!("A1 should have been removed"),
    }
    assert_eq!(map.node_count(), 2);
    assert!(map.node(&NodeId::from("n1")).unwrap().assets().is_empty());
    assert_eq!(map.asset_count(), 0);
}

#[test]
fn test_remove_never_inserted_is_not_found_and_changes_nothing() {
    let mut map = empty_map();
    let ids = SequentialNodeIds::new("n");
    map.insert(Asset::new("A1", left_straddler()), &ids).unwrap();
    let before = MapDocument::from_map(&map);

    assert_eq!(map.remove("ghost", &left_straddler()).unwrap(), Removal::NotFound);
    assert_eq!(
        map.remove("ghost", &Boundary::new(10.0, -5.0, -5.0, 20.0, 5.0, 5.0)).unwrap(),
        Removal::NotFound
    );

    let after = MapDocument::from_map(&map);
    assert_eq!(before, after);
    assert_eq!(
        serde_json::to_string(&before).unwrap(),
        serde_json::to_string(&after).unwrap()
    );
}

#[test]
fn test_remove_outside_root_is_a_boundary_error() {
    let mut map = empty_map();

    let far = Boundary::new(200_000.0, 0.0, 0.0, 300_000.0, 1.0, 1.0);
    assert!(matches!(map.remove("x", &far), Err(AssetMapError::OutsideBoundary { .. })));

    // Overhanging the root is not "inside" either.
    let overhang = Boundary::new(-200_000.0, -5.0, -5.0, -10.0, 5.0, 5.0);
    assert!(matches!(map.remove("x", &overhang), Err(AssetMapError::OutsideBoundary { .. })));
}

#[test]
fn test_remove_searches_the_node_insertion_would_choose() {
    let mut map = empty_map();
    let ids = SequentialNodeIds::new("n");
    map.insert(Asset::new("A1", left_straddler()), &ids).unwrap();

    // Same id, but a boundary that would have been placed at the root.
    let at_root = Boundary::new(-5.0, -5.0, -5.0, 5.0, 5.0, 5.0);
    assert_eq!(map.remove("A1", &at_root).unwrap(), Removal::NotFound);
    assert_eq!(map.asset_count(), 1);
}

#[test]
fn test_remove_removes_one_duplicate_at_a_time() {
    let mut map = empty_map();
    let ids = SequentialNodeIds::new("n");
    let b = Boundary::new(-5.0, -5.0, -5.0, 5.0, 5.0, 5.0);
    map.insert(Asset::new("dup", b), &ids).unwrap();
    map.insert(Asset::new("other", b), &ids).unwrap();
    map.insert(Asset::new("dup", b), &ids).unwrap();

    assert!(matches!(map.remove("dup", &b).unwrap(), Removal::Removed { .. }));
    let remaining: Vec<&str> = map.root().assets().iter().map(|a| a.asset_id.as_str()).collect();
    assert_eq!(remaining, vec!["other", "dup"]);
}

#[test]
fn test_remove_at_depth_cutoff() {
    let mut map = AssetMap::new(Boundary::cube(100_000.0), 3);
    let ids = SequentialNodeIds::new("n");
    let tiny = Boundary::new(1.0, 1.0, 1.0, 2.0, 2.0, 2.0);
    let placement = map.insert(Asset::new("tiny", tiny), &ids).unwrap();

    assert_eq!(
        map.remove("tiny", &tiny).unwrap(),
        Removal::Removed { node: placement.node, asset: Asset::new("tiny", tiny) }
    );
}

#[test]
fn test_locate_reports_missing_children() {
    let map = empty_map();
    assert!(map.locate(&left_straddler()).is_none());
    let at_root = map.locate(&Boundary::new(-5.0, -5.0, -5.0, 5.0, 5.0, 5.0)).unwrap();
    assert_eq!(at_root.node, NodeId::root());
}
