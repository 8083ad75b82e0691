//! Dashboard composition root
//!
//! Wires one injected store and prompter into the roster, synchronizer,
//! selection, and mutations, and is the operation boundary: every error is
//! logged, turned into the banner message, and swallowed here.

use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::ops::{MutationOps, PromptedOutcome};
use crate::prompt::Prompter;
use crate::roster::RosterCache;
use crate::selection::SelectionTracker;
use crate::store::{DocumentId, RemoteStore};
use crate::sync::GroupSynchronizer;
use crate::types::{Employee, Group, GroupId, Member};
use crate::view::GroupView;
use serde::Serialize;
use std::sync::Arc;

/// One group as presented
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPanel {
    pub id: GroupId,
    pub group_name: String,
    pub expanded: bool,
    /// Listed only for the expanded group
    pub members: Vec<Member>,
}

/// Everything needed to draw the dashboard once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub employees: Vec<Employee>,
    pub groups: Vec<GroupPanel>,
    pub error: Option<String>,
}

impl DashboardView {
    /// The expanded panel, if any
    #[must_use]
    pub fn expanded(&self) -> Option<&GroupPanel> {
        self.groups.iter().find(|panel| panel.expanded)
    }
}

/// Mounted dashboard session
#[derive(Debug)]
pub struct Dashboard {
    sync: GroupSynchronizer,
    ops: MutationOps,
    selection: SelectionTracker,
    error: Option<String>,
}

impl Dashboard {
    /// Fetch the roster, then subscribe to groups.
    ///
    /// Failures are shown in the banner; the dashboard still mounts with an
    /// empty roster or an empty group view. Dropping this future before it
    /// completes leaves no subscription behind.
    pub async fn mount(
        store: Arc<dyn RemoteStore>,
        prompter: Arc<dyn Prompter>,
        config: BoardConfig,
    ) -> Self {
        let mut error = None;

        let roster = match RosterCache::load(store.as_ref(), &config.employees_collection).await {
            Ok(roster) => roster,
            Err(e) => {
                error = Some(e.user_message().to_string());
                RosterCache::empty()
            }
        };

        let mut sync = GroupSynchronizer::new(Arc::clone(&store), config.clone());
        if let Err(e) = sync.start().await {
            error = Some(e.user_message().to_string());
        }

        let ops = MutationOps::new(
            store,
            prompter,
            Arc::new(roster),
            sync.view().clone(),
            config,
        );

        tracing::info!(
            "Dashboard mounted: {} employees, subscription {}",
            ops.roster().len(),
            if sync.is_active() { "active" } else { "inactive" }
        );

        Self {
            sync,
            ops,
            selection: SelectionTracker::new(),
            error,
        }
    }

    /// Release the subscription
    pub async fn unmount(mut self) {
        self.sync.shutdown().await;
        tracing::info!("Dashboard unmounted");
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> &GroupView {
        self.sync.view()
    }

    #[inline]
    #[must_use]
    pub fn roster(&self) -> &RosterCache {
        self.ops.roster()
    }

    #[inline]
    #[must_use]
    pub fn synchronizer(&self) -> &GroupSynchronizer {
        &self.sync
    }

    #[inline]
    #[must_use]
    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Current banner message
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Expand or collapse a group. Returns whether it is expanded afterwards.
    pub fn toggle_group(&mut self, id: &GroupId) -> bool {
        self.selection.toggle(id)
    }

    /// The expanded group as it currently exists in the view
    #[must_use]
    pub fn selected_group(&self) -> Option<Group> {
        self.selection.resolve(self.sync.view())
    }

    /// Returns the new group's id on success
    pub async fn create_group(
        &mut self,
        group_name: &str,
        member_emails: &[String],
    ) -> Option<DocumentId> {
        self.error = None;
        let result = self.ops.create_group(group_name, member_emails).await;
        self.settle(result)
    }

    /// Returns whether the task was written
    pub async fn assign_task(&mut self, group_id: &GroupId, member_email: &str, task: &str) -> bool {
        self.error = None;
        let result = self.ops.assign_task(group_id, member_email, task).await;
        self.settle(result).is_some()
    }

    /// "Assign Task" button: prompt, then assign.
    /// Returns whether a task was written.
    pub async fn prompt_assign_task(&mut self, group_id: &GroupId, member_email: &str) -> bool {
        self.error = None;
        let result = self.ops.prompt_assign_task(group_id, member_email).await;
        matches!(self.settle(result), Some(PromptedOutcome::Applied(_)))
    }

    /// "Update Task" button: prompt seeded with the member's current task,
    /// then assign. Returns whether a task was written.
    ///
    /// An unknown group or member sets the banner without prompting.
    pub async fn update_task(&mut self, group_id: &GroupId, member_email: &str) -> bool {
        self.error = None;
        let current_task = self
            .sync
            .view()
            .get(group_id)
            .and_then(|group| group.member(member_email).map(|m| m.task.clone()))
            .unwrap_or_default();
        let result = self
            .ops
            .update_task(group_id, member_email, &current_task)
            .await;
        matches!(self.settle(result), Some(PromptedOutcome::Applied(_)))
    }

    /// Returns whether the task was cleared remotely
    pub async fn delete_task(&mut self, group_id: &GroupId, member_email: &str) -> bool {
        self.error = None;
        let result = self.ops.delete_task(group_id, member_email).await;
        self.settle(result).is_some()
    }

    /// Returns whether the group was deleted remotely
    pub async fn delete_group(&mut self, group_id: &GroupId) -> bool {
        self.error = None;
        let result = self.ops.delete_group(group_id, &mut self.selection).await;
        self.settle(result).is_some()
    }

    /// Snapshot of everything on screen, with the selection re-resolved
    #[must_use]
    pub fn render(&self) -> DashboardView {
        let selected = self.selected_group();
        let groups = self
            .sync
            .view()
            .groups()
            .into_iter()
            .map(|group| match &selected {
                Some(expanded) if expanded.id == group.id => GroupPanel {
                    id: group.id,
                    group_name: group.group_name,
                    expanded: true,
                    members: expanded.members.clone(),
                },
                _ => GroupPanel {
                    id: group.id,
                    group_name: group.group_name,
                    expanded: false,
                    members: Vec::new(),
                },
            })
            .collect();

        DashboardView {
            employees: self.ops.roster().employees().to_vec(),
            groups,
            error: self.error.clone(),
        }
    }

    fn settle<T>(&mut self, result: Result<T, BoardError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("{:?} error: {}", e.kind(), e);
                self.error = Some(e.user_message().to_string());
                None
            }
        }
    }
}
