//! Replay scripts
//!
//! A script is a TOML list of `[[step]]` tables, each naming an `op`.
//! Groups are referenced by name since store ids are not known up front.
//!
//! ```toml
//! [[step]]
//! op = "create_group"
//! name = "Team1"
//! members = ["a@x.com", "b@x.com"]
//!
//! [[step]]
//! op = "update_task"
//! group = "Team1"
//! email = "a@x.com"
//! task = "Ship"        # omit to cancel the prompt
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// One user action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    CreateGroup {
        name: String,
        #[serde(default)]
        members: Vec<String>,
    },
    AssignTask {
        group: String,
        email: String,
        task: String,
    },
    /// Answer the update prompt with `task`, or cancel it when absent
    UpdateTask {
        group: String,
        email: String,
        #[serde(default)]
        task: Option<String>,
    },
    DeleteTask {
        group: String,
        email: String,
    },
    DeleteGroup {
        group: String,
    },
    Toggle {
        group: String,
    },
}

impl Step {
    /// Short label used in reports
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::CreateGroup { name, members } => {
                format!("create_group {} [{}]", name, members.join(", "))
            }
            Self::AssignTask { group, email, task } => {
                format!("assign_task {group} {email} {task:?}")
            }
            Self::UpdateTask { group, email, task } => match task {
                Some(task) => format!("update_task {group} {email} {task:?}"),
                None => format!("update_task {group} {email} (cancel)"),
            },
            Self::DeleteTask { group, email } => format!("delete_task {group} {email}"),
            Self::DeleteGroup { group } => format!("delete_group {group}"),
            Self::Toggle { group } => format!("toggle {group}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Script {
    #[serde(rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid script")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read script {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Create Team1 from Ann and Bo, expand it, and give Ann a task
    #[must_use]
    pub fn demo() -> Self {
        Self {
            steps: vec![
                Step::CreateGroup {
                    name: "Team1".to_string(),
                    members: vec!["a@x.com".to_string(), "b@x.com".to_string()],
                },
                Step::Toggle {
                    group: "Team1".to_string(),
                },
                Step::AssignTask {
                    group: "Team1".to_string(),
                    email: "a@x.com".to_string(),
                    task: "Write spec".to_string(),
                },
            ],
        }
    }
}
