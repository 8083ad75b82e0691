//! Remote document store adapter
//!
//! The board only depends on this capability contract:
//! - `read_all` / `add` / `update` / `delete` on named collections
//! - `subscribe`, which delivers a full-collection snapshot on every change
//!   through a bounded queue until the returned guard is released
//!
//! The store handle is constructed by the composition root and injected;
//! nothing in this crate reaches for a process-wide instance.

mod memory;

pub use memory::{MemoryStore, StoreCall};

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Top-level document fields
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Store-generated document identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    /// Create document from a JSON value. Non-object values yield no fields.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: serde_json::Value) -> Self {
        let fields = match fields {
            serde_json::Value::Object(map) => map,
            _ => Fields::new(),
        };
        Self {
            id: DocumentId::new(id),
            fields,
        }
    }
}

/// Full contents of a collection at one moment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Store-assigned emission order
    pub sequence: u64,
    pub documents: Vec<Document>,
}

/// Releases a live channel exactly once, on `cancel()` or on drop
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl SubscriptionGuard {
    /// Guard that runs `release` when cancelled or dropped
    #[inline]
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Guard with nothing to release
    #[inline]
    #[must_use]
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Release the channel. Further calls do nothing.
    pub fn cancel(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether the channel has already been released
    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Inbound snapshot queue paired with its release guard
#[derive(Debug)]
pub struct SnapshotStream {
    receiver: mpsc::Receiver<Snapshot>,
    guard: SubscriptionGuard,
}

impl SnapshotStream {
    #[inline]
    #[must_use]
    pub fn new(receiver: mpsc::Receiver<Snapshot>, guard: SubscriptionGuard) -> Self {
        Self { receiver, guard }
    }

    /// Next snapshot, or `None` once the store closes the channel
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Release the channel and stop receiving
    pub fn cancel(&mut self) {
        self.guard.cancel();
        self.receiver.close();
    }

    /// Whether the channel has been released
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.guard.is_released()
    }
}

/// Remote document store capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read every document of a collection
    async fn read_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Open a live channel on a collection. The current contents are
    /// delivered as the first snapshot.
    async fn subscribe(&self, collection: &str, buffer: usize)
        -> Result<SnapshotStream, StoreError>;

    /// Add a document, returning its generated id
    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError>;

    /// Overwrite the given top-level keys of a document
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<(), StoreError>;

    /// Delete a document
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError>;
}
