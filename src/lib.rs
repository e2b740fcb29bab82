#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![forbid(unsafe_code)]

//! # assetmap: a disk-backed kd-tree index of 3D asset boundaries
//!
//! `assetmap` partitions space into an axis-cycling kd-tree of axis-aligned
//! boxes and records, for every asset, the deepest node that fully contains
//! it. It features:
//! - Boundary classification and half-splitting (`core::geometry`)
//! - Lazy node creation with stable, minted node ids (`core::indexing::kdmap`)
//! - Whole-tree persistence guarded by revision tokens (`core::storage`)
//! - Bounding-box projection and client path resolution (`core::projection`)
//! - Batched boundary-state event intake (`event_engine`)
//! - A serialized, single-writer service with a JSON command router (`api`)

pub mod api;
pub mod core;
pub mod event_engine;

// Re-export key types for easier use by library consumers
pub use crate::api::{ApiError, AssetMapService, RequestRouter};
pub use crate::core::common::AssetMapError;
pub use crate::core::config::Config;
pub use crate::core::geometry::Boundary;
pub use crate::core::indexing::kdmap::{Asset, AssetMap};

/// Core result type for the library
pub type Result<T> = std::result::Result<T, AssetMapError>;
