// src/core/storage/traits.rs

use crate::core::common::AssetMapError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque token naming the currently saved version of a document.
///
/// Rendered as `<generation>-<tag>`; the generation advances by one on every
/// write to the same key, including writes after a delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Revision(token.into())
    }

    /// A fresh revision for the given generation.
    pub fn with_generation(generation: u64) -> Self {
        Revision(format!("{}-{}", generation, Uuid::new_v4().simple()))
    }

    /// Generation number, if the token has the `<n>-<tag>` shape.
    pub fn generation(&self) -> Option<u64> {
        self.0.split_once('-').and_then(|(g, _)| g.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as returned by [`DocumentStore::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub body: serde_json::Value,
    pub revision: Revision,
    pub saved_at: DateTime<Utc>,
}

/// Key-value document store addressed by key and guarded by revision.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches the live document under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<StoredDocument>, AssetMapError>;

    /// Creates `key`. Fails with `RevisionConflict` if a live document exists.
    async fn create(&self, key: &str, body: serde_json::Value) -> Result<Revision, AssetMapError>;

    /// Deletes `key` at `revision`. Fails with `RevisionConflict` if the
    /// revision is stale and `DocumentNotFound` if nothing is stored.
    async fn delete(&self, key: &str, revision: &Revision) -> Result<(), AssetMapError>;

    /// Overwrites `key` if it is still at `revision`, returning the new revision.
    ///
    /// The default is delete-then-create. The two calls are not atomic: if
    /// `create` fails after `delete` succeeded, the document is gone until
    /// the next successful save. Stores with a conditional update override
    /// this.
    async fn replace(
        &self,
        key: &str,
        revision: &Revision,
        body: serde_json::Value,
    ) -> Result<Revision, AssetMapError> {
        self.delete(key, revision).await?;
        self.create(key, body).await
    }
}
