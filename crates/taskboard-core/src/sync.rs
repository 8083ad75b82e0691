//! Group synchronizer
//!
//! Owns the live view of the `groups` collection:
//! - Acquires exactly one subscription per lifecycle
//! - Drains the snapshot queue on a consumer task, replacing the whole view
//!   with each snapshot (full replacement, never patching)
//! - Releases the subscription on shutdown, on drop, and when the store
//!   closes the channel
//!
//! Optimistic writes from `MutationOps` land in the same `GroupView`. There
//! is no mutual exclusion between the two writers beyond the view's lock, so
//! a snapshot emitted before a local write can briefly overwrite it; the
//! next snapshot that includes the write corrects the view.

use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::store::{RemoteStore, Snapshot, SnapshotStream};
use crate::types::Group;
use crate::view::GroupView;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Running snapshot consumer
#[derive(Debug)]
struct Consumer {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Keeps a `GroupView` in sync with the remote `groups` collection
pub struct GroupSynchronizer {
    store: Arc<dyn RemoteStore>,
    config: BoardConfig,
    view: GroupView,
    consumer: Option<Consumer>,
}

impl GroupSynchronizer {
    /// Create an idle synchronizer with an empty view
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, config: BoardConfig) -> Self {
        Self {
            store,
            config,
            view: GroupView::new(),
            consumer: None,
        }
    }

    /// Handle to the synchronized view
    #[inline]
    #[must_use]
    pub fn view(&self) -> &GroupView {
        &self.view
    }

    /// Snapshots applied to the view so far
    #[inline]
    #[must_use]
    pub fn snapshots_applied(&self) -> u64 {
        self.view.snapshots_applied()
    }

    /// Whether a live channel is currently held
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.consumer
            .as_ref()
            .is_some_and(|consumer| !consumer.handle.is_finished())
    }

    /// Acquire the subscription and start consuming snapshots.
    ///
    /// Does nothing while a channel is already held.
    ///
    /// # Errors
    /// - `BoardError::Subscription` if the channel cannot be opened
    pub async fn start(&mut self) -> Result<(), BoardError> {
        if self.is_active() {
            tracing::debug!("Group subscription already active");
            return Ok(());
        }

        // A consumer that ended on its own has already released its channel.
        self.consumer = None;

        let stream = self
            .store
            .subscribe(&self.config.groups_collection, self.config.snapshot_buffer)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching groups data: {}", e);
                BoardError::subscription("Failed to fetch groups data", e)
            })?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(consume(stream, self.view.clone(), shutdown_rx));
        self.consumer = Some(Consumer { shutdown, handle });

        tracing::debug!(
            "Subscribed to {} (buffer {})",
            self.config.groups_collection,
            self.config.snapshot_buffer
        );
        Ok(())
    }

    /// Stop consuming and release the channel
    pub async fn shutdown(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.shutdown.send(());
            if let Err(e) = consumer.handle.await {
                tracing::warn!("Snapshot consumer ended abnormally: {}", e);
            }
            tracing::debug!("Unsubscribed from {}", self.config.groups_collection);
        }
    }
}

impl Drop for GroupSynchronizer {
    fn drop(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            consumer.handle.abort();
        }
    }
}

impl std::fmt::Debug for GroupSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSynchronizer")
            .field("collection", &self.config.groups_collection)
            .field("active", &self.is_active())
            .field("groups", &self.view.len())
            .finish()
    }
}

/// Consumer task: apply snapshots until shutdown or channel close.
/// The stream (and its guard) is dropped on every exit path.
async fn consume(mut stream: SnapshotStream, view: GroupView, mut shutdown: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            next = stream.recv() => match next {
                Some(snapshot) => apply_snapshot(&view, snapshot),
                None => {
                    tracing::warn!("Group subscription closed by store");
                    break;
                }
            },
        }
    }
    stream.cancel();
}

fn apply_snapshot(view: &GroupView, snapshot: Snapshot) {
    let sequence = snapshot.sequence;
    let groups = map_snapshot(snapshot);
    let count = groups.len();
    let revision = view.replace_all(groups);
    tracing::debug!(
        "Applied snapshot {} with {} groups (revision {})",
        sequence,
        count,
        revision
    );
}

/// Map snapshot documents to groups.
///
/// Malformed documents are skipped. A repeated id keeps its first
/// occurrence so the view never holds two records with one id.
#[must_use]
pub fn map_snapshot(snapshot: Snapshot) -> Vec<Group> {
    let mut seen = HashSet::new();
    let mut groups = Vec::with_capacity(snapshot.documents.len());
    for doc in &snapshot.documents {
        match Group::from_document(doc) {
            Ok(group) => {
                if seen.insert(group.id.clone()) {
                    groups.push(group);
                } else {
                    tracing::warn!("Duplicate group id {} in snapshot", group.id);
                }
            }
            Err(e) => tracing::warn!("Skipping malformed group {}: {}", doc.id, e),
        }
    }
    groups
}
