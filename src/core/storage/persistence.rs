// src/core/storage/persistence.rs

//! Whole-tree persistence of an [`AssetMap`] as a single document.

use crate::core::common::AssetMapError;
use crate::core::config::Config;
use crate::core::geometry::Boundary;
use crate::core::indexing::kdmap::{AssetMap, MapDocument};
use crate::core::storage::traits::{DocumentStore, Revision};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A map read from (or freshly created in) the store.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub map: AssetMap,
    pub revision: Revision,
    /// True when no document existed and an empty root was saved.
    pub created: bool,
}

/// Loads and saves one [`AssetMap`] under a fixed document key.
///
/// Every store round-trip is bounded by `timeout`; expiry surfaces as
/// [`AssetMapError::Timeout`] and is treated like any other failed save.
#[derive(Debug)]
pub struct MapPersistence<S> {
    store: S,
    key: String,
    timeout: Duration,
    max_depth: usize,
    // Body of the last save that timed out before its outcome was known.
    unconfirmed: Mutex<Option<serde_json::Value>>,
}

impl<S: DocumentStore> MapPersistence<S> {
    pub fn new<K: Into<String>>(store: S, key: K, timeout: Duration, max_depth: usize) -> Self {
        MapPersistence { store, key: key.into(), timeout, max_depth, unconfirmed: Mutex::new(None) }
    }

    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(store, config.document_key.clone(), config.save_timeout(), config.max_depth)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the map document, if one exists.
    pub async fn load(&self) -> Result<Option<LoadedMap>, AssetMapError> {
        let Some(stored) = self.bounded("load", self.store.get(&self.key)).await? else {
            return Ok(None);
        };
        let document: MapDocument = serde_json::from_value(stored.body).map_err(|e| {
            AssetMapError::CorruptDocument(format!("document '{}': {}", self.key, e))
        })?;
        let map = document.into_map(self.max_depth)?;
        debug!(key = %self.key, revision = %stored.revision, nodes = map.node_count(), "map loaded");
        Ok(Some(LoadedMap { map, revision: stored.revision, created: false }))
    }

    /// Loads the map, or creates an empty one governing `root_boundary` and
    /// saves it before returning.
    pub async fn load_or_create(&self, root_boundary: Boundary) -> Result<LoadedMap, AssetMapError> {
        if let Some(loaded) = self.load().await? {
            return Ok(loaded);
        }
        let map = AssetMap::new(root_boundary, self.max_depth);
        let revision = self.create(&map).await?;
        info!(key = %self.key, %root_boundary, "created empty asset map");
        Ok(LoadedMap { map, revision, created: true })
    }

    /// Stores `map` under a key that currently holds no document.
    pub async fn create(&self, map: &AssetMap) -> Result<Revision, AssetMapError> {
        let body = self.encode(map)?;
        self.bounded("create", self.store.create(&self.key, body)).await
    }

    /// Overwrites the document saved at `revision` with `map`.
    ///
    /// With a delete-then-create store, a failure between the two calls
    /// leaves no document behind. The next save after such a failure finds
    /// the key empty and recreates it.
    ///
    /// A timed-out write may still land after the caller stopped waiting.
    /// When the stored document turns out to be the body of this save, or of
    /// an earlier timed-out one, its revision is adopted instead of failing
    /// with a conflict.
    pub async fn save(&self, map: &AssetMap, revision: &Revision) -> Result<Revision, AssetMapError> {
        let body = self.encode(map)?;
        let replaced = self.bounded("save", self.store.replace(&self.key, revision, body.clone())).await;
        let saved = match replaced {
            Err(AssetMapError::DocumentNotFound(_)) => {
                warn!(key = %self.key, stale = %revision, "saved document missing, recreating");
                self.bounded("save", self.store.create(&self.key, body.clone())).await
            }
            other => other,
        };
        let saved = match saved {
            Err(e @ (AssetMapError::Timeout(_) | AssetMapError::RevisionConflict { .. })) => {
                self.reconcile(&body, e).await
            }
            other => other,
        };

        let mut unconfirmed = self.unconfirmed.lock().unwrap_or_else(PoisonError::into_inner);
        match &saved {
            Ok(revision) => {
                *unconfirmed = None;
                debug!(key = %self.key, %revision, nodes = map.node_count(), "map saved");
            }
            Err(AssetMapError::Timeout(_)) => *unconfirmed = Some(body),
            Err(_) => {}
        }
        saved
    }

    /// Looks at what the store holds after a save failed with `err`.
    async fn reconcile(&self, body: &serde_json::Value, err: AssetMapError) -> Result<Revision, AssetMapError> {
        let current = match self.bounded("save", self.store.get(&self.key)).await {
            Ok(Some(current)) => current,
            _ => return Err(err),
        };
        if current.body == *body {
            info!(key = %self.key, revision = %current.revision, "save landed after the caller gave up, adopting its revision");
            return Ok(current.revision);
        }

        let earlier = self.unconfirmed.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if matches!(err, AssetMapError::RevisionConflict { .. }) && earlier.as_ref() == Some(&current.body) {
            info!(key = %self.key, revision = %current.revision, "earlier timed-out save landed, saving over it");
            return self
                .bounded("save", self.store.replace(&self.key, &current.revision, body.clone()))
                .await;
        }
        Err(err)
    }

    fn encode(&self, map: &AssetMap) -> Result<serde_json::Value, AssetMapError> {
        serde_json::to_value(MapDocument::from_map(map)).map_err(|e| encoding_failed(&self.key, e))
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, AssetMapError>
    where
        F: Future<Output = Result<T, AssetMapError>>,
    {
        tokio::time::timeout(self.timeout, fut).await.map_err(|_| {
            AssetMapError::Timeout(format!(
                "{} of '{}' exceeded {} ms",
                op,
                self.key,
                self.timeout.as_millis()
            ))
        })?
    }
}

// A document that cannot be encoded is a failed save, not a bad request.
fn encoding_failed(key: &str, err: serde_json::Error) -> AssetMapError {
    AssetMapError::Storage(format!("encoding document '{}': {}", key, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::indexing::kdmap::{Asset, SequentialNodeIds};
    use crate::core::storage::implementations::in_memory::FailOn;
    use crate::core::storage::traits::StoredDocument;
    use crate::core::storage::{FileDocumentStore, MemoryDocumentStore};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex as StdMutex};

    fn persistence(store: MemoryDocumentStore) -> MapPersistence<MemoryDocumentStore> {
        MapPersistence::new(store, "map", Duration::from_millis(200), 500)
    }

    #[tokio::test]
    async fn test_load_or_create_saves_fresh_root() {
        let store = MemoryDocumentStore::new();
        let p = persistence(store.clone());

        let loaded = p.load_or_create(Boundary::cube(100_000.0)).await.unwrap();
        assert!(loaded.created);
        assert!(loaded.map.root_id().is_root());
        assert_eq!(store.write_count().await, 1);

        let again = p.load_or_create(Boundary::cube(1.0)).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.revision, loaded.revision);
        assert_eq!(*again.map.root().boundary(), Boundary::cube(100_000.0));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let p = persistence(MemoryDocumentStore::new());
        let ids = SequentialNodeIds::new("n");
        let mut loaded = p.load_or_create(Boundary::cube(100_000.0)).await.unwrap();
        loaded
            .map
            .insert(Asset::new("A1", Boundary::new(-20.0, -5.0, -5.0, -10.0, 5.0, 5.0)), &ids)
            .unwrap();

        let rev = p.save(&loaded.map, &loaded.revision).await.unwrap();
        assert_ne!(rev, loaded.revision);

        let reloaded = p.load().await.unwrap().unwrap();
        assert_eq!(reloaded.revision, rev);
        assert_eq!(reloaded.map, loaded.map);
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let p = persistence(MemoryDocumentStore::new());
        let ids = SequentialNodeIds::new("n");
        let loaded = p.load_or_create(Boundary::cube(10.0)).await.unwrap();
        p.save(&loaded.map, &loaded.revision).await.unwrap();

        let mut changed = loaded.map.clone();
        changed.insert(Asset::new("A", Boundary::new(1.0, 1.0, 1.0, 2.0, 2.0, 2.0)), &ids).unwrap();
        assert!(matches!(
            p.save(&changed, &loaded.revision).await,
            Err(AssetMapError::RevisionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_save_of_identical_body_adopts_stored_revision() {
        let p = persistence(MemoryDocumentStore::new());
        let loaded = p.load_or_create(Boundary::cube(10.0)).await.unwrap();
        let current = p.save(&loaded.map, &loaded.revision).await.unwrap();

        assert_eq!(p.save(&loaded.map, &loaded.revision).await.unwrap(), current);
    }

    /// Applies every call to the wrapped store, then holds the reply back
    /// while a delay is set.
    #[derive(Debug, Clone, Default)]
    struct LateReplies {
        inner: MemoryDocumentStore,
        delay: Arc<StdMutex<Option<Duration>>>,
    }

    impl LateReplies {
        fn set_delay(&self, delay: Option<Duration>) {
            *self.delay.lock().unwrap() = delay;
        }

        async fn reply<T>(&self, result: T) -> T {
            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }

    #[async_trait]
    impl DocumentStore for LateReplies {
        async fn get(&self, key: &str) -> Result<Option<StoredDocument>, AssetMapError> {
            let result = self.inner.get(key).await;
            self.reply(result).await
        }

        async fn create(&self, key: &str, body: serde_json::Value) -> Result<Revision, AssetMapError> {
            let result = self.inner.create(key, body).await;
            self.reply(result).await
        }

        async fn delete(&self, key: &str, revision: &Revision) -> Result<(), AssetMapError> {
            let result = self.inner.delete(key, revision).await;
            self.reply(result).await
        }

        async fn replace(
            &self,
            key: &str,
            revision: &Revision,
            body: serde_json::Value,
        ) -> Result<Revision, AssetMapError> {
            let result = self.inner.replace(key, revision, body).await;
            self.reply(result).await
        }
    }

    fn with_asset(map: &AssetMap, id: &str, x: f64) -> AssetMap {
        let ids = SequentialNodeIds::new(id);
        let mut map = map.clone();
        map.insert(Asset::new(id, Boundary::new(x, 1.0, 1.0, x + 1.0, 2.0, 2.0)), &ids).unwrap();
        map
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_timed_out_save_that_landed() {
        let store = LateReplies::default();
        let p = MapPersistence::new(store.clone(), "map", Duration::from_millis(200), 500);
        let loaded = p.load_or_create(Boundary::cube(10.0)).await.unwrap();
        let first = with_asset(&loaded.map, "A", 1.0);

        store.set_delay(Some(Duration::from_secs(5)));
        let err = p.save(&first, &loaded.revision).await.unwrap_err();
        assert!(matches!(err, AssetMapError::Timeout(_)));
        store.set_delay(None);

        let rev = p.save(&first, &loaded.revision).await.unwrap();
        let reloaded = p.load().await.unwrap().unwrap();
        assert_eq!(reloaded.revision, rev);
        assert_eq!(reloaded.map, first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_save_overwrites_landed_timed_out_save() {
        let store = LateReplies::default();
        let p = MapPersistence::new(store.clone(), "map", Duration::from_millis(200), 500);
        let loaded = p.load_or_create(Boundary::cube(10.0)).await.unwrap();
        let first = with_asset(&loaded.map, "A", 1.0);
        let second = with_asset(&first, "B", -3.0);

        store.set_delay(Some(Duration::from_secs(5)));
        assert!(p.save(&first, &loaded.revision).await.is_err());
        store.set_delay(None);

        let rev = p.save(&second, &loaded.revision).await.unwrap();
        assert_eq!(rev.generation(), Some(3));
        assert_eq!(p.load().await.unwrap().unwrap().map, second);

        // Only the timed-out body is adopted over; an unrelated writer still conflicts.
        let third = with_asset(&second, "C", 5.0);
        assert!(matches!(
            p.save(&third, &loaded.revision).await,
            Err(AssetMapError::RevisionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_save_can_be_retried_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        let hasty = MapPersistence::new(store.clone(), "map", Duration::ZERO, 500);
        let patient = MapPersistence::new(store, "map", Duration::from_secs(10), 500);
        let ids = SequentialNodeIds::new("n");

        let loaded = patient.load_or_create(Boundary::cube(100_000.0)).await.unwrap();
        let mut map = loaded.map.clone();
        for i in 0..300 {
            let x = f64::from(i) * 97.0 - 20_000.0;
            let y = f64::from(i % 17) * 311.0 - 2_000.0;
            map.insert(Asset::new(format!("a{}", i), Boundary::new(x, y, -5.0, x + 3.0, y + 3.0, 5.0)), &ids)
                .unwrap();
        }

        // Whether or not this reports a timeout, its write still runs to completion.
        let _ = hasty.save(&map, &loaded.revision).await;

        let rev = patient.save(&map, &loaded.revision).await.unwrap();
        let reloaded = patient.load().await.unwrap().unwrap();
        assert_eq!(reloaded.revision, rev);
        assert_eq!(reloaded.map, map);
        assert_eq!(patient.save(&map, &rev).await.unwrap().generation(), Some(rev.generation().unwrap() + 1));
    }

    #[tokio::test]
    async fn test_save_recovers_after_lost_document() {
        let store = MemoryDocumentStore::new();
        let p = persistence(store.clone());
        let loaded = p.load_or_create(Boundary::cube(10.0)).await.unwrap();

        store.set_failure(Some(FailOn::Create)).await;
        assert!(p.save(&loaded.map, &loaded.revision).await.is_err());
        assert!(p.load().await.unwrap().is_none());

        store.set_failure(None).await;
        p.save(&loaded.map, &loaded.revision).await.unwrap();
        assert_eq!(p.load().await.unwrap().unwrap().map, loaded.map);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = MemoryDocumentStore::new();
        let p = persistence(store.clone());
        let loaded = p.load_or_create(Boundary::cube(10.0)).await.unwrap();

        store.set_latency(Some(Duration::from_secs(5))).await;
        let err = p.save(&loaded.map, &loaded.revision).await.unwrap_err();
        assert!(matches!(err, AssetMapError::Timeout(_)));
        assert!(err.is_persistence());
    }

    #[test]
    fn test_encoding_failure_is_a_persistence_error() {
        let cause = serde_json::from_str::<u8>("not a number").unwrap_err();
        let err = encoding_failed("map", cause);
        assert!(err.is_persistence());
        assert!(err.to_string().contains("encoding document 'map'"));
        assert_eq!(crate::ApiError::from(err).code(), 503);
    }

    #[tokio::test]
    async fn test_corrupt_body_is_reported() {
        let store = MemoryDocumentStore::new();
        store.create("map", serde_json::json!({"id": "root"})).await.unwrap();
        assert!(matches!(
            persistence(store).load().await,
            Err(AssetMapError::CorruptDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_depth_limited_tree_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        let p = MapPersistence::new(store, "map", Duration::from_secs(10), 500);
        let ids = SequentialNodeIds::new("n");

        let mut loaded = p.load_or_create(Boundary::cube(100_000.0)).await.unwrap();
        let point = Boundary::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0);
        loaded.map.insert(Asset::new("P", point), &ids).unwrap();
        assert_eq!(loaded.map.node_count(), 500);
        p.save(&loaded.map, &loaded.revision).await.unwrap();

        let reloaded = p.load().await.unwrap().unwrap();
        assert_eq!(reloaded.map, loaded.map);
    }
}
