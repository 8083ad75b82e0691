//! Mutation operations
//!
//! Every operation runs in two phases:
//! 1. Validate, compute the new state, and apply it to the local view
//!    synchronously (optimistic update)
//! 2. Issue the durable write to the remote store and report its failure
//!
//! The subscription delivers the authoritative state afterwards. A failed
//! write leaves the optimistic state in place unless
//! `rollback_on_write_failure` is set, in which case the prior record is
//! restored if no snapshot has landed in the meantime.
//!
//! Create Group is the exception to phase 1: the new group only appears
//! once a snapshot carries it with its store-assigned id. Delete Group is
//! the only operation that removes from the view before the remote call.

use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::prompt::{Notice, Prompter, TextPrompt, EMPTY_TASK_MESSAGE};
use crate::roster::RosterCache;
use crate::selection::SelectionTracker;
use crate::store::{DocumentId, RemoteStore};
use crate::types::{members_fields, Group, GroupFields, GroupId};
use crate::view::{GroupView, PriorGroup};
use std::sync::Arc;

/// Outcome of an operation that asks the user first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptedOutcome {
    /// The user supplied this task and it was written
    Applied(String),
    /// Prompt cancelled or left empty; nothing happened
    Unchanged,
}

/// Group and task mutations against one view and one store
pub struct MutationOps {
    store: Arc<dyn RemoteStore>,
    prompter: Arc<dyn Prompter>,
    roster: Arc<RosterCache>,
    view: GroupView,
    config: BoardConfig,
}

impl MutationOps {
    #[must_use]
    pub fn new(
        store: Arc<dyn RemoteStore>,
        prompter: Arc<dyn Prompter>,
        roster: Arc<RosterCache>,
        view: GroupView,
        config: BoardConfig,
    ) -> Self {
        Self {
            store,
            prompter,
            roster,
            view,
            config,
        }
    }

    /// Roster used to resolve new group members
    #[inline]
    #[must_use]
    pub fn roster(&self) -> &RosterCache {
        &self.roster
    }

    /// Create a group from selected roster emails.
    ///
    /// Members start with no task. The view is not touched: the group
    /// arrives with the next snapshot.
    ///
    /// # Errors
    /// - `BoardError::Validation` for an empty name, an empty selection, a
    ///   repeated email, or an email missing from the roster (before any
    ///   remote call)
    /// - `BoardError::Write` if the add fails
    pub async fn create_group(
        &self,
        group_name: &str,
        member_emails: &[String],
    ) -> Result<DocumentId, BoardError> {
        if group_name.trim().is_empty() {
            return Err(BoardError::validation("Group name cannot be empty"));
        }
        if member_emails.is_empty() {
            return Err(BoardError::validation("Select at least one member"));
        }
        let members = self.roster.resolve_members(member_emails)?;
        let fields = GroupFields::new(group_name, members).to_fields();

        match self.store.add(&self.config.groups_collection, fields).await {
            Ok(id) => {
                tracing::info!("New group added with ID: {}", id);
                Ok(id)
            }
            Err(e) => {
                tracing::error!("Error adding group: {}", e);
                Err(BoardError::write("Failed to create group", e))
            }
        }
    }

    /// Assign a non-empty task to a member.
    ///
    /// # Errors
    /// - `BoardError::Validation` for empty text or an unknown group/member
    /// - `BoardError::Write` if the update fails
    pub async fn assign_task(
        &self,
        group_id: &GroupId,
        member_email: &str,
        task: &str,
    ) -> Result<(), BoardError> {
        self.set_task(group_id, member_email, task, "Failed to assign task")
            .await?;
        tracing::info!("Task assigned successfully.");
        Ok(())
    }

    /// Ask for a task, then assign it. Cancel or empty input is a no-op.
    /// An unknown group or member is rejected before the prompt opens.
    ///
    /// # Errors
    /// Same as [`MutationOps::assign_task`].
    pub async fn prompt_assign_task(
        &self,
        group_id: &GroupId,
        member_email: &str,
    ) -> Result<PromptedOutcome, BoardError> {
        self.target(group_id, member_email)?;
        let outcome = self.prompter.ask_text(TextPrompt::assign_task()).await;
        self.apply_prompted(
            group_id,
            member_email,
            outcome.into_value(),
            "Failed to assign task",
        )
        .await
    }

    /// Ask for a replacement task seeded with `current_task`, then assign
    /// it. Cancel or empty input is a no-op. An unknown group or member is
    /// rejected before the prompt opens.
    ///
    /// # Errors
    /// Same as [`MutationOps::assign_task`], reported as "Failed to update task".
    pub async fn update_task(
        &self,
        group_id: &GroupId,
        member_email: &str,
        current_task: &str,
    ) -> Result<PromptedOutcome, BoardError> {
        self.target(group_id, member_email)?;
        let outcome = self
            .prompter
            .ask_text(TextPrompt::update_task(current_task))
            .await;
        self.apply_prompted(
            group_id,
            member_email,
            outcome.into_value(),
            "Failed to update task",
        )
        .await
    }

    /// Clear a member's task. Empty is the target state here, so this
    /// never fails task-text validation.
    ///
    /// # Errors
    /// - `BoardError::Validation` for an unknown group/member
    /// - `BoardError::Write` if the update fails
    pub async fn delete_task(&self, group_id: &GroupId, member_email: &str) -> Result<(), BoardError> {
        self.write_task(group_id, member_email, "", "Failed to delete task")
            .await?;
        tracing::info!("Task deleted successfully.");
        self.prompter.notify(Notice::task_deleted()).await;
        Ok(())
    }

    /// Remove a group locally, clear it from `selection` if selected, then
    /// delete it remotely.
    ///
    /// # Errors
    /// - `BoardError::Write` if the delete fails
    pub async fn delete_group(
        &self,
        group_id: &GroupId,
        selection: &mut SelectionTracker,
    ) -> Result<(), BoardError> {
        let prior = self.view.remove(group_id);
        if prior.is_none() {
            tracing::warn!("Group {} not in view, deleting remotely only", group_id);
        }
        if selection.clear_if(group_id) {
            tracing::debug!("Cleared selection of deleted group {}", group_id);
        }

        let result = self
            .store
            .delete(&self.config.groups_collection, &DocumentId::from(group_id))
            .await;

        match result {
            Ok(()) => {
                tracing::info!("Group {} deleted", group_id);
                self.prompter.notify(Notice::group_deleted()).await;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error deleting group: {}", e);
                self.roll_back(prior);
                Err(BoardError::write("Failed to delete group", e))
            }
        }
    }

    async fn apply_prompted(
        &self,
        group_id: &GroupId,
        member_email: &str,
        value: Option<String>,
        failure_message: &str,
    ) -> Result<PromptedOutcome, BoardError> {
        match value {
            Some(task) => {
                self.set_task(group_id, member_email, &task, failure_message)
                    .await?;
                tracing::info!("Task for {} set to {:?}", member_email, task);
                Ok(PromptedOutcome::Applied(task))
            }
            None => {
                tracing::debug!("Task prompt for {} dismissed", member_email);
                Ok(PromptedOutcome::Unchanged)
            }
        }
    }

    async fn set_task(
        &self,
        group_id: &GroupId,
        member_email: &str,
        task: &str,
        failure_message: &str,
    ) -> Result<(), BoardError> {
        if task.is_empty() {
            return Err(BoardError::validation(EMPTY_TASK_MESSAGE));
        }
        self.write_task(group_id, member_email, task, failure_message)
            .await
    }

    /// Optimistically set one member's task, then rewrite the group's whole
    /// members array remotely.
    async fn write_task(
        &self,
        group_id: &GroupId,
        member_email: &str,
        task: &str,
        failure_message: &str,
    ) -> Result<(), BoardError> {
        let group = self.target(group_id, member_email)?;
        let members = group
            .members_with_task(member_email, task)
            .ok_or_else(|| not_a_member(member_email, &group))?;

        let prior = self.view.set_members(group_id, members.clone());

        let result = self
            .store
            .update(
                &self.config.groups_collection,
                &DocumentId::from(group_id),
                members_fields(&members),
            )
            .await;

        result.map_err(|e| {
            tracing::error!("Error updating group document: {}", e);
            self.roll_back(prior);
            BoardError::write(failure_message, e)
        })
    }

    /// Current group holding `member_email`
    fn target(&self, group_id: &GroupId, member_email: &str) -> Result<Group, BoardError> {
        let group = self
            .view
            .get(group_id)
            .ok_or_else(|| BoardError::validation(format!("Unknown group: {group_id}")))?;
        if group.member(member_email).is_none() {
            return Err(not_a_member(member_email, &group));
        }
        Ok(group)
    }

    fn roll_back(&self, prior: Option<PriorGroup>) {
        if !self.config.rollback_on_write_failure {
            return;
        }
        if let Some(prior) = prior {
            let id = prior.group.id.clone();
            if self.view.restore(prior) {
                tracing::debug!("Rolled back optimistic write to {}", id);
            } else {
                tracing::debug!("Newer snapshot supersedes rollback of {}", id);
            }
        }
    }
}

fn not_a_member(member_email: &str, group: &Group) -> BoardError {
    BoardError::validation(format!(
        "{member_email} is not a member of {}",
        group.group_name
    ))
}

impl std::fmt::Debug for MutationOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationOps")
            .field("roster", &self.roster.len())
            .field("groups", &self.view.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, StoreError};
    use crate::prompt::{MockPrompter, PromptOutcome};
    use crate::store::MockRemoteStore;
    use crate::types::{Employee, Member};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn roster() -> Arc<RosterCache> {
        Arc::new(RosterCache::from_employees(vec![
            Employee::new("Ann", "a@x.com"),
            Employee::new("Bo", "b@x.com"),
        ]))
    }

    fn team() -> Group {
        Group::new(
            "g1",
            "Team1",
            vec![Member::new("Ann", "a@x.com"), Member::new("Bo", "b@x.com")],
        )
    }

    fn ops_with(store: MockRemoteStore, prompter: MockPrompter, config: BoardConfig) -> MutationOps {
        let view = GroupView::new();
        view.replace_all(vec![team()]);
        MutationOps::new(Arc::new(store), Arc::new(prompter), roster(), view, config)
    }

    fn ops(store: MockRemoteStore, prompter: MockPrompter) -> MutationOps {
        ops_with(store, prompter, BoardConfig::new())
    }

    fn offline() -> StoreError {
        StoreError::Unavailable("offline".to_string())
    }

    #[tokio::test]
    async fn create_group_sends_unassigned_members() {
        let expected = GroupFields::new(
            "Team1",
            vec![Member::new("Ann", "a@x.com"), Member::new("Bo", "b@x.com")],
        )
        .to_fields();

        let mut store = MockRemoteStore::new();
        store
            .expect_add()
            .with(eq("groups"), eq(expected))
            .times(1)
            .returning(|_, _| Ok(DocumentId::new("new-id")));

        let ops = ops(store, MockPrompter::new());
        let before = ops.view.groups();

        let id = ops
            .create_group("Team1", &["a@x.com".to_string(), "b@x.com".to_string()])
            .await
            .unwrap();

        assert_eq!(id, DocumentId::new("new-id"));
        // no optimistic insert
        assert_eq!(ops.view.groups(), before);
    }

    #[tokio::test]
    async fn create_group_validation_makes_no_remote_call() {
        // Any store call on this mock panics.
        let ops = ops(MockRemoteStore::new(), MockPrompter::new());

        let empty_name = ops.create_group("", &["a@x.com".to_string()]).await;
        assert_eq!(empty_name.unwrap_err().kind(), ErrorKind::Validation);

        let blank_name = ops.create_group("   ", &["a@x.com".to_string()]).await;
        assert_eq!(blank_name.unwrap_err().kind(), ErrorKind::Validation);

        let no_members = ops.create_group("Team", &[]).await;
        assert_eq!(no_members.unwrap_err().kind(), ErrorKind::Validation);

        let unknown = ops.create_group("Team", &["z@x.com".to_string()]).await;
        assert_eq!(unknown.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn create_group_rejects_repeated_member() {
        // Any store call on this mock panics.
        let ops = ops(MockRemoteStore::new(), MockPrompter::new());

        let err = ops
            .create_group("Team1", &["a@x.com".to_string(), "a@x.com".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "Duplicate member: a@x.com");
    }

    #[tokio::test]
    async fn create_group_write_failure() {
        let mut store = MockRemoteStore::new();
        store.expect_add().returning(|_, _| Err(offline()));
        let ops = ops(store, MockPrompter::new());

        let err = ops
            .create_group("Team", &["a@x.com".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert_eq!(err.user_message(), "Failed to create group");
    }

    #[tokio::test]
    async fn assign_task_updates_view_and_writes_whole_array() {
        let expected_members = vec![
            Member::new("Ann", "a@x.com").with_task("Write spec"),
            Member::new("Bo", "b@x.com"),
        ];
        let expected = members_fields(&expected_members);

        let mut store = MockRemoteStore::new();
        store
            .expect_update()
            .withf(move |collection, id, fields| {
                collection == "groups" && id == &DocumentId::new("g1") && fields == &expected
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let ops = ops(store, MockPrompter::new());
        ops.assign_task(&GroupId::new("g1"), "a@x.com", "Write spec")
            .await
            .unwrap();

        assert_eq!(ops.view.get(&GroupId::new("g1")).unwrap().members, expected_members);
    }

    #[tokio::test]
    async fn assign_empty_task_rejected() {
        let ops = ops(MockRemoteStore::new(), MockPrompter::new());
        let err = ops
            .assign_task(&GroupId::new("g1"), "a@x.com", "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "Task cannot be empty");
    }

    #[tokio::test]
    async fn assign_task_unknown_targets_rejected() {
        let ops = ops(MockRemoteStore::new(), MockPrompter::new());

        let unknown_group = ops.assign_task(&GroupId::new("nope"), "a@x.com", "x").await;
        assert_eq!(unknown_group.unwrap_err().kind(), ErrorKind::Validation);

        let unknown_member = ops.assign_task(&GroupId::new("g1"), "z@x.com", "x").await;
        assert_eq!(unknown_member.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn failed_write_keeps_optimistic_state_by_default() {
        let mut store = MockRemoteStore::new();
        store.expect_update().returning(|_, _, _| Err(offline()));
        let ops = ops(store, MockPrompter::new());

        let err = ops
            .assign_task(&GroupId::new("g1"), "a@x.com", "Ship")
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Failed to assign task");
        let group = ops.view.get(&GroupId::new("g1")).unwrap();
        assert_eq!(group.member("a@x.com").unwrap().task, "Ship");
    }

    #[tokio::test]
    async fn failed_write_rolls_back_when_enabled() {
        let mut store = MockRemoteStore::new();
        store.expect_update().returning(|_, _, _| Err(offline()));
        let ops = ops_with(store, MockPrompter::new(), BoardConfig::new().with_rollback(true));

        let _ = ops.assign_task(&GroupId::new("g1"), "a@x.com", "Ship").await;

        assert_eq!(ops.view.get(&GroupId::new("g1")).unwrap(), team());
    }

    #[tokio::test]
    async fn delete_task_clears_and_notifies() {
        let mut store = MockRemoteStore::new();
        store.expect_update().times(1).returning(|_, _, _| Ok(()));
        let mut prompter = MockPrompter::new();
        prompter
            .expect_notify()
            .with(eq(Notice::task_deleted()))
            .times(1)
            .returning(|_| ());

        let ops = ops(store, prompter);
        let id = GroupId::new("g1");
        let seeded = ops.view.get(&id).unwrap().members_with_task("a@x.com", "Old").unwrap();
        ops.view.set_members(&id, seeded);

        ops.delete_task(&id, "a@x.com").await.unwrap();

        let group = ops.view.get(&id).unwrap();
        assert_eq!(group.member("a@x.com").unwrap().task, "");
    }

    #[tokio::test]
    async fn delete_task_failure_has_no_notice() {
        let mut store = MockRemoteStore::new();
        store.expect_update().returning(|_, _, _| Err(offline()));
        // notify is not expected: calling it panics
        let ops = ops(store, MockPrompter::new());

        let err = ops
            .delete_task(&GroupId::new("g1"), "a@x.com")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to delete task");
    }

    #[tokio::test]
    async fn update_task_cancelled_is_noop() {
        let mut prompter = MockPrompter::new();
        prompter
            .expect_ask_text()
            .withf(|prompt| prompt.initial == "Current")
            .returning(|_| PromptOutcome::Cancelled);

        let ops = ops(MockRemoteStore::new(), prompter);
        let outcome = ops
            .update_task(&GroupId::new("g1"), "a@x.com", "Current")
            .await
            .unwrap();
        assert_eq!(outcome, PromptedOutcome::Unchanged);
    }

    #[tokio::test]
    async fn update_task_failure_has_its_own_message() {
        let mut store = MockRemoteStore::new();
        store.expect_update().returning(|_, _, _| Err(offline()));
        let mut prompter = MockPrompter::new();
        prompter
            .expect_ask_text()
            .returning(|_| PromptOutcome::Submitted("Ship".to_string()));

        let ops = ops(store, prompter);
        let err = ops
            .update_task(&GroupId::new("g1"), "a@x.com", "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert_eq!(err.user_message(), "Failed to update task");
    }

    #[tokio::test]
    async fn unknown_targets_rejected_before_prompting() {
        // Neither mock has expectations: a prompt or a write panics.
        let ops = ops(MockRemoteStore::new(), MockPrompter::new());

        let err = ops
            .update_task(&GroupId::new("nope"), "a@x.com", "")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Unknown group: nope");

        let err = ops
            .update_task(&GroupId::new("g1"), "z@x.com", "")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "z@x.com is not a member of Team1");

        let err = ops
            .prompt_assign_task(&GroupId::new("nope"), "a@x.com")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ops
            .prompt_assign_task(&GroupId::new("g1"), "z@x.com")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn update_task_empty_is_noop() {
        let mut prompter = MockPrompter::new();
        prompter
            .expect_ask_text()
            .returning(|_| PromptOutcome::Submitted(String::new()));

        let ops = ops(MockRemoteStore::new(), prompter);
        let outcome = ops
            .update_task(&GroupId::new("g1"), "a@x.com", "")
            .await
            .unwrap();
        assert_eq!(outcome, PromptedOutcome::Unchanged);
    }

    #[tokio::test]
    async fn update_task_same_value_is_idempotent() {
        let mut store = MockRemoteStore::new();
        store.expect_update().times(3).returning(|_, _, _| Ok(()));
        let mut prompter = MockPrompter::new();
        prompter
            .expect_ask_text()
            .returning(|prompt| PromptOutcome::Submitted(prompt.initial));

        let ops = ops(store, prompter);
        let id = GroupId::new("g1");
        ops.assign_task(&id, "a@x.com", "Write spec").await.unwrap();
        for _ in 0..2 {
            let current = ops.view.get(&id).unwrap().member("a@x.com").unwrap().task.clone();
            let outcome = ops.update_task(&id, "a@x.com", &current).await.unwrap();
            assert_eq!(outcome, PromptedOutcome::Applied("Write spec".to_string()));
        }

        assert_eq!(
            ops.view.get(&id).unwrap().member("a@x.com").unwrap().task,
            "Write spec"
        );
    }

    #[tokio::test]
    async fn prompt_assign_task_applies_submission() {
        let mut store = MockRemoteStore::new();
        store.expect_update().times(1).returning(|_, _, _| Ok(()));
        let mut prompter = MockPrompter::new();
        prompter
            .expect_ask_text()
            .withf(|prompt| prompt.title == "Assign Task")
            .returning(|_| PromptOutcome::Submitted("Review".to_string()));

        let ops = ops(store, prompter);
        let outcome = ops
            .prompt_assign_task(&GroupId::new("g1"), "b@x.com")
            .await
            .unwrap();

        assert_eq!(outcome, PromptedOutcome::Applied("Review".to_string()));
        let group = ops.view.get(&GroupId::new("g1")).unwrap();
        assert_eq!(group.member("b@x.com").unwrap().task, "Review");
    }

    #[tokio::test]
    async fn delete_group_removes_and_clears_selection() {
        let mut store = MockRemoteStore::new();
        store
            .expect_delete()
            .with(eq("groups"), eq(DocumentId::new("g1")))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut prompter = MockPrompter::new();
        prompter
            .expect_notify()
            .with(eq(Notice::group_deleted()))
            .times(1)
            .returning(|_| ());

        let ops = ops(store, prompter);
        let mut selection = SelectionTracker::new();
        selection.toggle(&GroupId::new("g1"));

        ops.delete_group(&GroupId::new("g1"), &mut selection)
            .await
            .unwrap();

        assert!(ops.view.is_empty());
        assert!(selection.selected_id().is_none());
    }

    #[tokio::test]
    async fn delete_group_keeps_other_selection() {
        let mut store = MockRemoteStore::new();
        store.expect_delete().returning(|_, _| Ok(()));
        let mut prompter = MockPrompter::new();
        prompter.expect_notify().returning(|_| ());

        let ops = ops(store, prompter);
        ops.view.replace_all(vec![team(), Group::new("g2", "Team2", vec![])]);
        let mut selection = SelectionTracker::new();
        selection.toggle(&GroupId::new("g2"));

        ops.delete_group(&GroupId::new("g1"), &mut selection)
            .await
            .unwrap();

        assert_eq!(selection.resolve(&ops.view).unwrap().group_name, "Team2");
    }

    #[tokio::test]
    async fn delete_group_failure_rolls_back_when_enabled() {
        let mut store = MockRemoteStore::new();
        store.expect_delete().returning(|_, _| Err(offline()));
        let ops = ops_with(store, MockPrompter::new(), BoardConfig::new().with_rollback(true));
        let mut selection = SelectionTracker::new();

        let err = ops
            .delete_group(&GroupId::new("g1"), &mut selection)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Failed to delete group");
        assert_eq!(ops.view.groups(), vec![team()]);
    }
}
