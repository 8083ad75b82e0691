//! Testing utilities for the taskboard workspace
//!
//! Shared fixtures, a fault-injecting store, and a scripted prompter.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskboard_core::{
    Document, DocumentId, Employee, Fields, Group, GroupView, MemoryStore, Notice, PromptOutcome,
    Prompter, RemoteStore, SnapshotStream, StoreError, TextPrompt,
};
use tokio::sync::Notify;

/// How long wait helpers block before failing the test
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

pub fn ann() -> Employee {
    Employee::new("Ann", "a@x.com")
}

pub fn bo() -> Employee {
    Employee::new("Bo", "b@x.com")
}

/// The two-person roster used throughout the tests
pub fn roster_fixture() -> Vec<Employee> {
    vec![ann(), bo()]
}

/// Store seeded with `employees` under the default collection name
pub fn store_with_roster(employees: &[Employee]) -> MemoryStore {
    MemoryStore::new().with_collection(
        "employees",
        employees.iter().map(Employee::to_fields).collect(),
    )
}

/// Group document with the given id and members `(name, email, task)`
pub fn group_document(id: &str, name: &str, members: &[(&str, &str, &str)]) -> Document {
    let members: Vec<_> = members
        .iter()
        .map(|(name, email, task)| json!({"name": name, "email": email, "task": task}))
        .collect();
    Document::new(id, json!({"groupName": name, "members": members}))
}

/// Wait until `predicate` holds for the view, panicking after `WAIT_TIMEOUT`
pub async fn wait_until<F>(view: &GroupView, predicate: F)
where
    F: Fn(&[Group]) -> bool,
{
    if tokio::time::timeout(WAIT_TIMEOUT, view.wait_until(predicate))
        .await
        .is_err()
    {
        panic!("view did not reach expected state: {:?}", view.groups());
    }
}

/// Wait until the view has applied at least `count` snapshots
pub async fn wait_for_snapshots(view: &GroupView, count: u64) {
    let mut changes = view.changes();
    let reached = tokio::time::timeout(WAIT_TIMEOUT, async {
        while view.snapshots_applied() < count {
            if changes.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
    if reached.is_err() {
        panic!(
            "expected {} snapshots, saw {}",
            count,
            view.snapshots_applied()
        );
    }
}

/// `MemoryStore` wrapper that can fail or stall on demand
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: Arc<AtomicBool>,
    fail_subscribe: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    read_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// The wrapped store
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Reject every add/update/delete without applying it
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold `read_all` until the returned handle is notified
    pub fn stall_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.read_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn read_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let gate = self.read_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Self::check(&self.fail_reads)?;
        self.inner.read_all(collection).await
    }

    async fn subscribe(
        &self,
        collection: &str,
        buffer: usize,
    ) -> Result<SnapshotStream, StoreError> {
        Self::check(&self.fail_subscribe)?;
        self.inner.subscribe(collection, buffer).await
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.add(collection, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.delete(collection, id).await
    }
}

/// Prompter answering from a queue; cancels once the queue is empty
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<PromptOutcome>>,
    prompts: Mutex<Vec<TextPrompt>>,
    notices: Mutex<Vec<Notice>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue answers in order
    pub fn with_answers(answers: impl IntoIterator<Item = PromptOutcome>) -> Self {
        let prompter = Self::new();
        prompter.answers.lock().extend(answers);
        prompter
    }

    pub fn push_answer(&self, answer: PromptOutcome) {
        self.answers.lock().push_back(answer);
    }

    /// Prompts shown so far
    pub fn prompts(&self) -> Vec<TextPrompt> {
        self.prompts.lock().clone()
    }

    /// Notices shown so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask_text(&self, prompt: TextPrompt) -> PromptOutcome {
        self.prompts.lock().push(prompt);
        self.answers
            .lock()
            .pop_front()
            .unwrap_or(PromptOutcome::Cancelled)
    }

    async fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
