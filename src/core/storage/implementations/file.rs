// src/core/storage/implementations/file.rs

//! Directory-backed document store: one `<key>.json` envelope per key.
//!
//! Every write goes to a temporary file that is renamed over the target, so
//! a crash leaves either the old or the new envelope on disk. Deleting a key
//! leaves a tombstone envelope behind to keep its generation advancing.
//! Each operation runs on the blocking pool as one unit, so a caller that
//! times out leaves the store either before or after the whole operation.

use crate::core::common::AssetMapError;
use crate::core::storage::traits::{DocumentStore, Revision, StoredDocument};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(rename = "_rev")]
    rev: Revision,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    body: serde_json::Value,
}

impl Envelope {
    fn live(&self) -> Option<StoredDocument> {
        if self.deleted {
            return None;
        }
        Some(StoredDocument {
            body: self.body.clone(),
            revision: self.rev.clone(),
            saved_at: self.saved_at,
        })
    }

    fn generation(&self) -> u64 {
        self.rev.generation().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    dir: PathBuf,
    // Held by the blocking task for a whole read-check-write, so a caller
    // that stops waiting cannot let another operation in mid-write.
    lock: Arc<Mutex<()>>,
}

impl FileDocumentStore {
    /// Opens `dir`, creating it if needed.
    pub fn open<P: Into<PathBuf>>(dir: P) -> Result<Self, AssetMapError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(FileDocumentStore { dir, lock: Arc::new(Mutex::new(())) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AssetMapError> {
        if key.is_empty() || key.contains(&['/', '\\'][..]) || key.contains("..") {
            return Err(AssetMapError::Storage(format!("invalid document key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Runs `f` on the blocking pool with the directory lock held. Once
    /// started it runs to completion even if the returned future is dropped.
    async fn locked<T, F>(&self, f: F) -> Result<T, AssetMapError>
    where
        F: FnOnce() -> Result<T, AssetMapError> + Send + 'static,
        T: Send + 'static,
    {
        let lock = Arc::clone(&self.lock);
        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        })
        .await
        .map_err(|e| AssetMapError::Internal(format!("blocking store task failed: {}", e)))?
    }
}

fn check_revision(key: &str, current: Option<&Envelope>, expected: &Revision) -> Result<(), AssetMapError> {
    match current {
        Some(env) if !env.deleted && env.rev == *expected => Ok(()),
        Some(env) if !env.deleted => Err(AssetMapError::RevisionConflict {
            key: key.to_string(),
            message: format!("stale revision {}, current is {}", expected, env.rev),
        }),
        _ => Err(AssetMapError::DocumentNotFound(key.to_string())),
    }
}

fn write_live(
    path: &Path,
    key: &str,
    previous: Option<&Envelope>,
    body: serde_json::Value,
) -> Result<Revision, AssetMapError> {
    let generation = previous.map_or(0, Envelope::generation) + 1;
    let rev = Revision::with_generation(generation);
    let envelope = Envelope { rev: rev.clone(), saved_at: Utc::now(), deleted: false, body };
    write_envelope(path, &envelope)?;
    debug!(key, revision = %rev, "document written");
    Ok(rev)
}

fn read_envelope(path: &Path) -> Result<Option<Envelope>, AssetMapError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AssetMapError::Io(e)),
    };
    // Map documents nest one level per tree level, deeper than serde_json's
    // default limit.
    let mut de = serde_json::Deserializer::from_slice(&bytes);
    de.disable_recursion_limit();
    let envelope = Envelope::deserialize(&mut de).map_err(|e| {
        AssetMapError::CorruptDocument(format!("{}: {}", path.display(), e))
    })?;
    de.end().map_err(|e| AssetMapError::CorruptDocument(format!("{}: {}", path.display(), e)))?;
    Ok(Some(envelope))
}

fn write_envelope(path: &Path, envelope: &Envelope) -> Result<(), AssetMapError> {
    let temp_file_path = path.with_extension("tmp");

    struct TempFileGuard<'a>(&'a Path);
    impl Drop for TempFileGuard<'_> {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(self.0);
        }
    }
    let _temp_file_guard = TempFileGuard(&temp_file_path);

    let temp_file =
        OpenOptions::new().write(true).create(true).truncate(true).open(&temp_file_path)?;
    let mut writer = BufWriter::new(temp_file);
    serde_json::to_writer(&mut writer, envelope)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    rename(&temp_file_path, path)?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<StoredDocument>, AssetMapError> {
        let path = self.path_for(key)?;
        self.locked(move || Ok(read_envelope(&path)?.and_then(|env| env.live()))).await
    }

    async fn create(&self, key: &str, body: serde_json::Value) -> Result<Revision, AssetMapError> {
        let path = self.path_for(key)?;
        let key = key.to_string();
        self.locked(move || {
            let current = read_envelope(&path)?;
            if let Some(env) = current.as_ref().filter(|env| !env.deleted) {
                return Err(AssetMapError::RevisionConflict {
                    key,
                    message: format!("document already exists at {}", env.rev),
                });
            }
            write_live(&path, &key, current.as_ref(), body)
        })
        .await
    }

    async fn delete(&self, key: &str, revision: &Revision) -> Result<(), AssetMapError> {
        let path = self.path_for(key)?;
        let key = key.to_string();
        let revision = revision.clone();
        self.locked(move || {
            let current = read_envelope(&path)?;
            check_revision(&key, current.as_ref(), &revision)?;

            let tombstone = Envelope {
                rev: revision.clone(),
                saved_at: Utc::now(),
                deleted: true,
                body: serde_json::Value::Null,
            };
            write_envelope(&path, &tombstone)?;
            debug!(key = %key, revision = %revision, "document deleted");
            Ok(())
        })
        .await
    }

    /// Conditional overwrite in a single rename; no window without a document.
    async fn replace(
        &self,
        key: &str,
        revision: &Revision,
        body: serde_json::Value,
    ) -> Result<Revision, AssetMapError> {
        let path = self.path_for(key)?;
        let key = key.to_string();
        let revision = revision.clone();
        self.locked(move || {
            let current = read_envelope(&path)?;
            check_revision(&key, current.as_ref(), &revision)?;
            write_live(&path, &key, current.as_ref(), body)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_then_get_survives_reopen() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        let rev = store.create("map", json!({"id": "root"})).await.unwrap();

        let reopened = FileDocumentStore::open(dir.path()).unwrap();
        let doc = reopened.get("map").await.unwrap().unwrap();
        assert_eq!(doc.revision, rev);
        assert_eq!(doc.body, json!({"id": "root"}));
        assert!(!dir.path().join("map.tmp").exists());
    }

    #[tokio::test]
    async fn test_replace_checks_revision() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        let first = store.create("map", json!(1)).await.unwrap();
        let second = store.replace("map", &first, json!(2)).await.unwrap();
        assert_eq!(second.generation(), Some(2));

        assert!(matches!(
            store.replace("map", &first, json!(3)).await,
            Err(AssetMapError::RevisionConflict { .. })
        ));
        assert_eq!(store.get("map").await.unwrap().unwrap().body, json!(2));
    }

    #[tokio::test]
    async fn test_delete_leaves_tombstone_and_generation_advances() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        let first = store.create("map", json!(1)).await.unwrap();
        store.delete("map", &first).await.unwrap();

        assert!(store.get("map").await.unwrap().is_none());
        assert!(matches!(
            store.delete("map", &first).await,
            Err(AssetMapError::DocumentNotFound(_))
        ));
        let again = store.create("map", json!(2)).await.unwrap();
        assert_eq!(again.generation(), Some(2));
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("../map").await, Err(AssetMapError::Storage(_))));
        assert!(matches!(store.create("a/b", json!(1)).await, Err(AssetMapError::Storage(_))));
    }

    #[tokio::test]
    async fn test_garbage_file_is_corrupt() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("map.json"), b"{not json").unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("map").await, Err(AssetMapError::CorruptDocument(_))));
    }

    #[tokio::test]
    async fn test_abandoned_replace_still_completes() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        let first = store.create("map", json!(1)).await.unwrap();

        // The caller gives up after the write was handed to the blocking pool.
        let abandoned =
            tokio::time::timeout(Duration::ZERO, store.replace("map", &first, json!(2))).await;
        drop(abandoned);

        let mut current = store.get("map").await.unwrap().unwrap();
        for _ in 0..200 {
            if current.body == json!(2) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            current = store.get("map").await.unwrap().unwrap();
        }
        assert_eq!(current.body, json!(2));
        assert_eq!(current.revision.generation(), Some(2));
        let third = store.replace("map", &current.revision, json!(3)).await.unwrap();
        assert_eq!(third.generation(), Some(3));
        assert!(!dir.path().join("map.tmp").exists());
    }

    #[tokio::test]
    async fn test_reads_deeply_nested_documents() {
        let mut body = json!({"id": "leaf"});
        for depth in 0..600 {
            body = json!({"id": format!("n{}", depth), "leftChild": body});
        }
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        store.create("map", body.clone()).await.unwrap();
        assert_eq!(store.get("map").await.unwrap().unwrap().body, body);
    }
}
