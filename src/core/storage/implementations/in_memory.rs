// src/core/storage/implementations/in_memory.rs

//! In-process document store. Clones share the same contents, which lets a
//! caller keep a handle for inspection after passing the store on.

use crate::core::common::AssetMapError;
use crate::core::storage::traits::{DocumentStore, Revision, StoredDocument};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Store operation that an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Create,
    Delete,
}

#[derive(Debug, Default)]
struct Entry {
    live: Option<StoredDocument>,
    generation: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    writes: u64,
    fail_on: Option<FailOn>,
    latency: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of create/delete calls that reached the store.
    pub async fn write_count(&self) -> u64 {
        self.inner.lock().await.writes
    }

    /// Makes every subsequent call of the given kind fail until cleared.
    pub async fn set_failure(&self, fail_on: Option<FailOn>) {
        self.inner.lock().await.fail_on = fail_on;
    }

    /// Delays every call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.inner.lock().await.latency = latency;
    }

    async fn simulate_latency(&self) {
        let latency = self.inner.lock().await.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn unavailable(op: &str, key: &str) -> AssetMapError {
    AssetMapError::Storage(format!("store unavailable during {} of '{}'", op, key))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<StoredDocument>, AssetMapError> {
        self.simulate_latency().await;
        let inner = self.inner.lock().await;
        Ok(inner.entries.get(key).and_then(|e| e.live.clone()))
    }

    async fn create(&self, key: &str, body: serde_json::Value) -> Result<Revision, AssetMapError> {
        self.simulate_latency().await;
        let mut inner = self.inner.lock().await;
        inner.writes += 1;
        if inner.fail_on == Some(FailOn::Create) {
            return Err(unavailable("create", key));
        }

        let entry = inner.entries.entry(key.to_string()).or_default();
        if let Some(live) = &entry.live {
            return Err(AssetMapError::RevisionConflict {
                key: key.to_string(),
                message: format!("document already exists at {}", live.revision),
            });
        }
        entry.generation += 1;
        let revision = Revision::with_generation(entry.generation);
        entry.live = Some(StoredDocument { body, revision: revision.clone(), saved_at: Utc::now() });
        Ok(revision)
    }

    async fn delete(&self, key: &str, revision: &Revision) -> Result<(), AssetMapError> {
        self.simulate_latency().await;
        let mut inner = self.inner.lock().await;
        inner.writes += 1;
        if inner.fail_on == Some(FailOn::Delete) {
            return Err(unavailable("delete", key));
        }

        let entry = inner
            .entries
            .get_mut(key)
            .filter(|e| e.live.is_some())
            .ok_or_else(|| AssetMapError::DocumentNotFound(key.to_string()))?;
        match &entry.live {
            Some(live) if live.revision == *revision => {
                entry.live = None;
                Ok(())
            }
            Some(live) => Err(AssetMapError::RevisionConflict {
                key: key.to_string(),
                message: format!("stale revision {}, current is {}", revision, live.revision),
            }),
            None => Err(AssetMapError::DocumentNotFound(key.to_string())),
        }
    }
}
