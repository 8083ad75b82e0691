//! Shared in-memory view of groups
//!
//! One `GroupView` exists per synchronizer. Clones share state.
//!
//! # Invariants
//! - Only the snapshot consumer and the optimistic phase of a mutation write
//!   the view; the write API is crate-private.
//! - Every write completes under one lock acquisition, so a reader never
//!   observes a half-applied change. Races are outcome-level: whichever
//!   write lands last wins.
//! - `revision` increases by one per write and is broadcast on a watch
//!   channel.

use crate::types::{Group, GroupId, Member};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Default)]
struct ViewState {
    groups: Vec<Group>,
    revision: u64,
    snapshots_applied: u64,
}

/// Record of an optimistic write, used to roll it back
#[derive(Debug, Clone)]
pub(crate) struct PriorGroup {
    pub(crate) group: Group,
    pub(crate) index: usize,
    /// Snapshot count when the optimistic write was applied
    pub(crate) snapshots_applied: u64,
}

/// Shared, observable list of groups
#[derive(Debug, Clone)]
pub struct GroupView {
    state: Arc<RwLock<ViewState>>,
    changes: Arc<watch::Sender<u64>>,
}

impl GroupView {
    /// Create an empty view
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(ViewState::default())),
            changes: Arc::new(changes),
        }
    }

    /// All groups, in snapshot order
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        self.state.read().groups.clone()
    }

    /// Group by id, if it is currently present
    #[must_use]
    pub fn get(&self, id: &GroupId) -> Option<Group> {
        self.state.read().groups.iter().find(|g| &g.id == id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &GroupId) -> bool {
        self.state.read().groups.iter().any(|g| &g.id == id)
    }

    /// First group with the given name. Names are not unique.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Group> {
        self.state
            .read()
            .groups
            .iter()
            .find(|g| g.group_name == name)
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().groups.is_empty()
    }

    /// Number of writes applied so far
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Number of inbound snapshots applied so far
    #[must_use]
    pub fn snapshots_applied(&self) -> u64 {
        self.state.read().snapshots_applied
    }

    /// Change signal carrying the latest revision
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Wait until the revision reaches at least `revision`
    pub async fn wait_for_revision(&self, revision: u64) -> u64 {
        let mut rx = self.changes();
        let reached = match rx.wait_for(|current| *current >= revision).await {
            Ok(current) => *current,
            // Sender lives as long as `self`.
            Err(_) => self.revision(),
        };
        reached
    }

    /// Wait until `predicate` holds for the current groups
    pub async fn wait_until<F>(&self, predicate: F)
    where
        F: Fn(&[Group]) -> bool,
    {
        let mut rx = self.changes();
        loop {
            if predicate(&self.state.read().groups) {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Replace the whole view with a snapshot's contents
    pub(crate) fn replace_all(&self, groups: Vec<Group>) -> u64 {
        let revision = {
            let mut state = self.state.write();
            state.groups = groups;
            state.snapshots_applied += 1;
            state.revision += 1;
            state.revision
        };
        self.changes.send_replace(revision);
        revision
    }

    /// Replace one group's members. Returns the record it replaced.
    pub(crate) fn set_members(&self, id: &GroupId, members: Vec<Member>) -> Option<PriorGroup> {
        let (prior, revision) = {
            let mut state = self.state.write();
            let snapshots_applied = state.snapshots_applied;
            let index = state.groups.iter().position(|g| &g.id == id)?;
            let old_members = std::mem::replace(&mut state.groups[index].members, members);
            let prior = PriorGroup {
                group: Group {
                    members: old_members,
                    ..state.groups[index].clone()
                },
                index,
                snapshots_applied,
            };
            state.revision += 1;
            (prior, state.revision)
        };
        self.changes.send_replace(revision);
        Some(prior)
    }

    /// Remove one group. Returns the removed record.
    pub(crate) fn remove(&self, id: &GroupId) -> Option<PriorGroup> {
        let (prior, revision) = {
            let mut state = self.state.write();
            let snapshots_applied = state.snapshots_applied;
            let index = state.groups.iter().position(|g| &g.id == id)?;
            let group = state.groups.remove(index);
            state.revision += 1;
            (
                PriorGroup {
                    group,
                    index,
                    snapshots_applied,
                },
                state.revision,
            )
        };
        self.changes.send_replace(revision);
        Some(prior)
    }

    /// Put back a record captured by `set_members` or `remove`.
    ///
    /// Skipped when a snapshot has landed since the capture: that snapshot
    /// is authoritative. Returns whether the record was restored.
    pub(crate) fn restore(&self, prior: PriorGroup) -> bool {
        let revision = {
            let mut state = self.state.write();
            if state.snapshots_applied != prior.snapshots_applied {
                return false;
            }
            match state.groups.iter().position(|g| g.id == prior.group.id) {
                Some(index) => state.groups[index] = prior.group,
                None => {
                    let index = prior.index.min(state.groups.len());
                    state.groups.insert(index, prior.group);
                }
            }
            state.revision += 1;
            state.revision
        };
        self.changes.send_replace(revision);
        true
    }
}

impl Default for GroupView {
    fn default() -> Self {
        Self::new()
    }
}
