//! Drive a dashboard through a script
//!
//! Each step goes through the same `Dashboard` entry points a user would
//! hit. After a step that reached the store, the runner waits for the next
//! snapshot so later steps see the authoritative state.

use crate::prompter::ScriptPrompter;
use crate::script::{Script, Step};
use crate::seed::SeedFile;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use taskboard_core::{
    BoardConfig, Dashboard, DashboardView, GroupId, GroupView, Notice, PromptOutcome,
};

/// How long to wait for a write to come back through the subscription
const SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: String,
    pub applied: bool,
    /// Banner message left by the step
    pub error: Option<String>,
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub notices: Vec<Notice>,
    pub board: DashboardView,
}

/// Mount a dashboard over the seeded store, run every step, and unmount
pub async fn run(seed: SeedFile, script: &Script, config: BoardConfig) -> ReplayReport {
    let store = Arc::new(seed.into_store(&config));
    let prompter = Arc::new(ScriptPrompter::new());
    let mut dashboard = Dashboard::mount(store, prompter.clone(), config).await;

    if dashboard.synchronizer().is_active() {
        settle(dashboard.view(), 0).await;
    }

    let mut steps = Vec::with_capacity(script.steps.len());
    for step in &script.steps {
        let report = apply(&mut dashboard, &prompter, step).await;
        tracing::info!(
            "{} -> {}",
            report.step,
            if report.applied { "applied" } else { "not applied" }
        );
        steps.push(report);
    }

    let board = dashboard.render();
    dashboard.unmount().await;

    ReplayReport {
        steps,
        notices: prompter.notices(),
        board,
    }
}

async fn apply(dashboard: &mut Dashboard, prompter: &ScriptPrompter, step: &Step) -> StepReport {
    let step_label = step.describe();
    let before = dashboard.view().snapshots_applied();

    match execute(dashboard, prompter, step).await {
        Ok(Executed { applied, wrote }) => {
            if wrote {
                settle(dashboard.view(), before).await;
            }
            StepReport {
                step: step_label,
                applied,
                error: dashboard.error().map(ToString::to_string),
            }
        }
        Err(message) => {
            tracing::warn!("{}: {}", step_label, message);
            StepReport {
                step: step_label,
                applied: false,
                error: Some(message),
            }
        }
    }
}

struct Executed {
    applied: bool,
    /// A remote write was issued, so a snapshot will follow
    wrote: bool,
}

impl Executed {
    fn written(done: bool) -> Self {
        Self {
            applied: done,
            wrote: done,
        }
    }
}

async fn execute(
    dashboard: &mut Dashboard,
    prompter: &ScriptPrompter,
    step: &Step,
) -> Result<Executed, String> {
    let outcome = match step {
        Step::CreateGroup { name, members } => {
            Executed::written(dashboard.create_group(name, members).await.is_some())
        }
        Step::AssignTask { group, email, task } => {
            let id = lookup(dashboard.view(), group)?;
            Executed::written(dashboard.assign_task(&id, email, task).await)
        }
        Step::UpdateTask { group, email, task } => {
            let id = lookup(dashboard.view(), group)?;
            prompter.queue(
                task.clone()
                    .map_or(PromptOutcome::Cancelled, PromptOutcome::Submitted),
            );
            Executed::written(dashboard.update_task(&id, email).await)
        }
        Step::DeleteTask { group, email } => {
            let id = lookup(dashboard.view(), group)?;
            Executed::written(dashboard.delete_task(&id, email).await)
        }
        Step::DeleteGroup { group } => {
            let id = lookup(dashboard.view(), group)?;
            Executed::written(dashboard.delete_group(&id).await)
        }
        Step::Toggle { group } => {
            let id = lookup(dashboard.view(), group)?;
            dashboard.toggle_group(&id);
            Executed {
                applied: true,
                wrote: false,
            }
        }
    };
    Ok(outcome)
}

fn lookup(view: &GroupView, name: &str) -> Result<GroupId, String> {
    view.find_by_name(name)
        .map(|group| group.id)
        .ok_or_else(|| format!("Unknown group: {name}"))
}

/// Wait until the view has applied more than `seen` snapshots
async fn settle(view: &GroupView, seen: u64) {
    let mut changes = view.changes();
    let arrived = tokio::time::timeout(SETTLE_TIMEOUT, async {
        while view.snapshots_applied() <= seen {
            if changes.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
    if arrived.is_err() {
        tracing::warn!("No snapshot within {:?}; view may be stale", SETTLE_TIMEOUT);
    }
}
