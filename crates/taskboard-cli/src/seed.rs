//! Seed files
//!
//! A seed file is TOML with an `employees` list and a `groups` list:
//!
//! ```toml
//! [[employees]]
//! name = "Ann"
//! email = "a@x.com"
//!
//! [[groups]]
//! id = "g1"            # optional; generated when absent
//! name = "Team1"
//! members = [{ name = "Ann", email = "a@x.com", task = "Plan" }]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use taskboard_core::types::GroupFields;
use taskboard_core::{BoardConfig, Document, DocumentId, Employee, MemoryStore, Member};
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedGroup {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

/// Initial store contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedFile {
    pub employees: Vec<Employee>,
    pub groups: Vec<SeedGroup>,
}

impl SeedFile {
    /// Parse a seed from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid seed file")
    }

    /// Read and parse a seed file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read seed file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// The Ann/Bo roster with no groups
    #[must_use]
    pub fn demo() -> Self {
        Self {
            employees: vec![
                Employee::new("Ann", "a@x.com"),
                Employee::new("Bo", "b@x.com"),
            ],
            groups: Vec::new(),
        }
    }

    /// Fresh store holding this seed under the configured collections
    #[must_use]
    pub fn into_store(self, config: &BoardConfig) -> MemoryStore {
        let employees = self.employees.iter().map(Employee::to_fields).collect();
        let groups = self
            .groups
            .into_iter()
            .map(|group| Document {
                id: DocumentId::new(group.id.unwrap_or_else(|| Ulid::new().to_string())),
                fields: GroupFields::new(group.name, group.members).to_fields(),
            })
            .collect();

        MemoryStore::new()
            .with_collection(&config.employees_collection, employees)
            .with_documents(&config.groups_collection, groups)
    }
}
