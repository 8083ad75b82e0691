//! In-process document store
//!
//! Behaves like the remote store as far as the board can tell: generated
//! ids, top-level key replacement on update, and a full-collection snapshot
//! pushed to every live subscriber after each write.

use super::{Document, DocumentId, Fields, RemoteStore, Snapshot, SnapshotStream, SubscriptionGuard};
use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, MutexGuard};
use ulid::Ulid;

/// A call observed by the store, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    ReadAll { collection: String },
    Subscribe { collection: String },
    Add { collection: String, fields: Fields },
    Update { collection: String, id: DocumentId, fields: Fields },
    Delete { collection: String, id: DocumentId },
}

#[derive(Debug)]
struct Subscriber {
    collection: String,
    sender: mpsc::Sender<Snapshot>,
}

#[derive(Debug, Default)]
struct Collections {
    documents: HashMap<String, Vec<Document>>,
    sequence: u64,
}

impl Collections {
    fn snapshot(&mut self, collection: &str) -> Snapshot {
        self.sequence += 1;
        Snapshot {
            sequence: self.sequence,
            documents: self.documents.get(collection).cloned().unwrap_or_default(),
        }
    }
}

/// In-memory `RemoteStore`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    // Held across snapshot fan-out so subscribers see writes in order.
    state: Arc<Mutex<Collections>>,
    // Seeded documents not yet moved into `state`.
    seeds: Arc<SyncMutex<Vec<(String, Vec<Document>)>>>,
    subscribers: Arc<SyncMutex<BTreeMap<u64, Subscriber>>>,
    next_subscriber: Arc<AtomicU64>,
    calls: Arc<SyncMutex<Vec<StoreCall>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with documents, generating ids
    #[must_use]
    pub fn with_collection(self, collection: &str, entries: Vec<Fields>) -> Self {
        let documents = entries
            .into_iter()
            .map(|fields| Document {
                id: DocumentId::new(Ulid::new().to_string()),
                fields,
            })
            .collect();
        self.with_documents(collection, documents)
    }

    /// Seed a collection with documents carrying explicit ids.
    ///
    /// Seeds are appended to the collection before the next store call
    /// reads it, even if another call currently holds the store.
    #[must_use]
    pub fn with_documents(self, collection: &str, documents: Vec<Document>) -> Self {
        self.seeds.lock().push((collection.to_string(), documents));
        self
    }

    /// Current contents of a collection
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock_state()
            .await
            .documents
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live channels across all collections
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Every call received so far
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Write calls only (add/update/delete)
    #[must_use]
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    StoreCall::Add { .. } | StoreCall::Update { .. } | StoreCall::Delete { .. }
                )
            })
            .cloned()
            .collect()
    }

    /// Push a snapshot of `collection` to every live subscriber.
    ///
    /// Must be called with the state lock held.
    async fn broadcast(&self, state: &mut Collections, collection: &str) {
        let senders: Vec<(u64, mpsc::Sender<Snapshot>)> = self
            .subscribers
            .lock()
            .iter()
            .filter(|(_, sub)| sub.collection == collection)
            .map(|(id, sub)| (*id, sub.sender.clone()))
            .collect();

        if senders.is_empty() {
            return;
        }

        let snapshot = state.snapshot(collection);
        for (id, sender) in senders {
            if sender.send(snapshot.clone()).await.is_err() {
                tracing::debug!("Dropping closed subscriber {}", id);
                self.subscribers.lock().remove(&id);
            }
        }
    }

    /// Lock the collections, applying pending seeds first
    async fn lock_state(&self) -> MutexGuard<'_, Collections> {
        let mut state = self.state.lock().await;
        let seeds = std::mem::take(&mut *self.seeds.lock());
        for (collection, documents) in seeds {
            state
                .documents
                .entry(collection)
                .or_default()
                .extend(documents);
        }
        state
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.record(StoreCall::ReadAll {
            collection: collection.to_string(),
        });
        Ok(self.documents(collection).await)
    }

    async fn subscribe(
        &self,
        collection: &str,
        buffer: usize,
    ) -> Result<SnapshotStream, StoreError> {
        self.record(StoreCall::Subscribe {
            collection: collection.to_string(),
        });

        let mut state = self.lock_state().await;
        let (sender, receiver) = mpsc::channel(buffer.max(1));

        // Fresh channel with capacity >= 1: the initial snapshot always fits.
        let initial = state.snapshot(collection);
        sender
            .try_send(initial)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed) + 1;
        self.subscribers.lock().insert(
            id,
            Subscriber {
                collection: collection.to_string(),
                sender,
            },
        );
        drop(state);

        let subscribers = Arc::clone(&self.subscribers);
        let guard = SubscriptionGuard::new(move || {
            subscribers.lock().remove(&id);
        });

        tracing::debug!("Subscriber {} attached to {}", id, collection);
        Ok(SnapshotStream::new(receiver, guard))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        self.record(StoreCall::Add {
            collection: collection.to_string(),
            fields: fields.clone(),
        });

        let mut state = self.lock_state().await;
        let id = DocumentId::new(Ulid::new().to_string());
        state
            .documents
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        self.broadcast(&mut state, collection).await;
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::Update {
            collection: collection.to_string(),
            id: id.clone(),
            fields: fields.clone(),
        });

        let mut state = self.lock_state().await;
        let doc = state
            .documents
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| &d.id == id))
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in fields {
            doc.fields.insert(key, value);
        }
        self.broadcast(&mut state, collection).await;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        self.record(StoreCall::Delete {
            collection: collection.to_string(),
            id: id.clone(),
        });

        let mut state = self.lock_state().await;
        let docs = state.documents.entry(collection.to_string()).or_default();
        let before = docs.len();
        docs.retain(|d| &d.id != id);
        if docs.len() == before {
            return Err(StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        self.broadcast(&mut state, collection).await;
        Ok(())
    }
}
