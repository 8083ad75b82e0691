//! User prompt surface
//!
//! The modal input dialog and post-action notices live outside this crate.
//! The board only asks for text, gets back a submission or a cancellation,
//! and posts notices. A cancelled prompt is always a no-op for the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Shown when a text prompt is confirmed with no input
pub const EMPTY_TASK_MESSAGE: &str = "Task cannot be empty";

/// Request for one line of free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPrompt {
    pub title: String,
    pub label: Option<String>,
    /// Pre-filled input value
    pub initial: String,
    pub placeholder: String,
    pub confirm_label: String,
    pub cancel_label: String,
    /// Validation message for empty input
    pub empty_message: String,
}

impl TextPrompt {
    /// Prompt for a new task assignment
    #[must_use]
    pub fn assign_task() -> Self {
        Self {
            title: "Assign Task".to_string(),
            label: Some("Enter task for this member".to_string()),
            initial: String::new(),
            placeholder: "Task".to_string(),
            confirm_label: "Assign".to_string(),
            cancel_label: "Cancel".to_string(),
            empty_message: EMPTY_TASK_MESSAGE.to_string(),
        }
    }

    /// Prompt for replacing a task, seeded with the current one
    #[must_use]
    pub fn update_task(current_task: &str) -> Self {
        Self {
            title: "Update Task".to_string(),
            label: None,
            initial: current_task.to_string(),
            placeholder: "Enter new task".to_string(),
            confirm_label: "Update".to_string(),
            cancel_label: "Cancel".to_string(),
            empty_message: EMPTY_TASK_MESSAGE.to_string(),
        }
    }
}

/// Result of a text prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptOutcome {
    Submitted(String),
    Cancelled,
}

impl PromptOutcome {
    /// Submitted non-empty text, if any
    #[must_use]
    pub fn into_value(self) -> Option<String> {
        match self {
            Self::Submitted(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }
}

/// Post-action confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn task_deleted() -> Self {
        Self::new("Deleted!", "Task has been deleted.")
    }

    #[must_use]
    pub fn group_deleted() -> Self {
        Self::new("Deleted!", "Group has been deleted.")
    }
}

/// Modal input surface
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask for free text
    async fn ask_text(&self, prompt: TextPrompt) -> PromptOutcome;

    /// Show a confirmation notice
    async fn notify(&self, notice: Notice);
}
