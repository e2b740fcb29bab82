// src/api/service.rs
//! The asset map service: owns the map, serializes its mutations and saves
//! the whole map after each one.

use crate::api::errors::ApiError;
use crate::core::common::AssetMapError;
use crate::core::config::Config;
use crate::core::geometry::Boundary;
use crate::core::indexing::kdmap::{
    Asset, AssetMap, MapDocument, NodeIdSource, Placement, Removal, UuidNodeIds,
};
use crate::core::projection::{project_bounding_boxes, BoxNode, ProjectionMode};
use crate::core::storage::{DocumentStore, MapPersistence, Revision};
use crate::event_engine::handler::{process_batch, AssetDelivery, ClientEvent, NoDelivery};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct MapState {
    map: AssetMap,
    revision: Revision,
    /// The map has changes the store has not acknowledged.
    dirty: bool,
}

/// Single-writer owner of one asset map and its persisted document.
///
/// Mutations hold the write lock across descent and save, so two saves never
/// race on the same revision. Reads take the read lock and never observe a
/// map mid-mutation.
#[derive(Debug)]
pub struct AssetMapService<S> {
    state: RwLock<MapState>,
    persistence: MapPersistence<S>,
    ids: Box<dyn NodeIdSource>,
    delivery: Box<dyn AssetDelivery>,
    config: Config,
}

impl<S: DocumentStore> AssetMapService<S> {
    /// Loads the map from `store`, creating and saving an empty root if the
    /// store holds none.
    pub async fn start(store: S, config: Config) -> Result<Self, AssetMapError> {
        let ids = Box::new(UuidNodeIds::new(config.node_id_prefix.clone()));
        Self::start_with(store, config, ids, Box::new(NoDelivery)).await
    }

    pub async fn start_with(
        store: S,
        config: Config,
        ids: Box<dyn NodeIdSource>,
        delivery: Box<dyn AssetDelivery>,
    ) -> Result<Self, AssetMapError> {
        config.validate()?;
        let persistence = MapPersistence::from_config(store, &config);
        let loaded = persistence.load_or_create(Boundary::cube(config.root_extent)).await?;
        info!(
            key = persistence.key(),
            created = loaded.created,
            nodes = loaded.map.node_count(),
            assets = loaded.map.asset_count(),
            "asset map service started"
        );
        let state = MapState { map: loaded.map, revision: loaded.revision, dirty: false };
        Ok(AssetMapService { state: RwLock::new(state), persistence, ids, delivery, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn persistence(&self) -> &MapPersistence<S> {
        &self.persistence
    }

    /// Inserts `asset` and saves the map before returning.
    ///
    /// A rejected asset leaves the map untouched and makes no store call. A
    /// failed save leaves the asset in memory; retry with [`flush`](Self::flush),
    /// not by inserting again.
    pub async fn insert_asset(&self, asset: Asset) -> Result<Placement, ApiError> {
        let mut state = self.state.write().await;
        let asset_id = asset.asset_id.clone();
        let placement = state.map.insert(asset, self.ids.as_ref())?;
        debug!(asset = %asset_id, node = %placement.node, depth = placement.depth, "asset inserted");
        self.save(&mut state).await?;
        Ok(placement)
    }

    /// Removes `asset_id` from the node its boundary places it in and saves.
    /// Not-found is a successful no-op with no store call.
    pub async fn remove_asset(&self, asset_id: &str, boundary: &Boundary) -> Result<Removal, ApiError> {
        let mut state = self.state.write().await;
        let removal = state.map.remove(asset_id, boundary)?;
        match &removal {
            Removal::Removed { node, .. } => {
                debug!(asset = asset_id, node = %node, "asset removed");
                self.save(&mut state).await?;
            }
            Removal::NotFound => debug!(asset = asset_id, "remove: asset not found"),
        }
        Ok(removal)
    }

    /// Snapshot of the whole map in its nested document form.
    pub async fn get_asset_map(&self) -> MapDocument {
        MapDocument::from_map(&self.state.read().await.map)
    }

    /// Clone of the in-memory map.
    pub async fn snapshot(&self) -> AssetMap {
        self.state.read().await.map.clone()
    }

    /// Bounding-box hierarchy of the map. The mode is checked before any
    /// traversal.
    pub async fn get_asset_map_bounding_boxes(&self, mode: Option<&str>) -> Result<BoxNode, ApiError> {
        let mode = ProjectionMode::parse(mode)?;
        Ok(project_bounding_boxes(&self.state.read().await.map, mode))
    }

    /// Processes one batch of client events into a single configs response.
    pub async fn get_asset_map_updates(
        &self,
        events: &[ClientEvent],
    ) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
        let state = self.state.read().await;
        Ok(process_batch(events, &state.map, self.delivery.as_ref())?)
    }

    /// True while a failed save has left the store behind the map.
    pub async fn is_dirty(&self) -> bool {
        self.state.read().await.dirty
    }

    /// Saves the map if an earlier save failed. Returns whether a save ran.
    pub async fn flush(&self) -> Result<bool, ApiError> {
        let mut state = self.state.write().await;
        if !state.dirty {
            return Ok(false);
        }
        self.save(&mut state).await?;
        info!("pending map changes saved");
        Ok(true)
    }

    async fn save(&self, state: &mut MapState) -> Result<(), ApiError> {
        match self.persistence.save(&state.map, &state.revision).await {
            Ok(revision) => {
                state.revision = revision;
                state.dirty = false;
                Ok(())
            }
            Err(e) => {
                state.dirty = true;
                warn!(
                    error = %e,
                    "map save failed, in-memory map is ahead of the stored document until the next successful save"
                );
                Err(e.into())
            }
        }
    }
}
