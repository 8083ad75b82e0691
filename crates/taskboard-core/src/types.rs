//! Core types for the task board
//!
//! Defines the records shared by every component:
//! - Employees (roster entries, read-only for a session)
//! - Groups and their embedded members
//! - Mapping between records and remote document fields

use crate::store::{Document, DocumentId, Fields};
use serde::{Deserialize, Serialize};

/// Stable group identifier, assigned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl GroupId {
    /// Create group ID from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<DocumentId> for GroupId {
    fn from(value: DocumentId) -> Self {
        Self(value.0)
    }
}

impl From<&GroupId> for DocumentId {
    fn from(value: &GroupId) -> Self {
        DocumentId(value.0.clone())
    }
}

/// Roster entry. Email is the natural key within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub email: String,
}

impl Employee {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Copy this employee into an unassigned group member
    #[inline]
    #[must_use]
    pub fn to_member(&self) -> Member {
        Member::new(self.name.clone(), self.email.clone())
    }

    /// Document fields for this employee
    pub fn to_fields(&self) -> Fields {
        to_fields(self)
    }
}

/// Group member. `task` is empty when nothing is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub task: String,
}

impl Member {
    /// Create an unassigned member
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            task: String::new(),
        }
    }

    /// With task
    #[inline]
    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    /// Whether a task is assigned
    #[inline]
    #[must_use]
    pub fn has_task(&self) -> bool {
        !self.task.is_empty()
    }
}

/// Live group record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(rename = "groupName")]
    pub group_name: String,
    pub members: Vec<Member>,
}

impl Group {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<GroupId>, group_name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            id: id.into(),
            group_name: group_name.into(),
            members,
        }
    }

    /// Find a member by email
    #[must_use]
    pub fn member(&self, email: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.email == email)
    }

    /// Members array with `email`'s task replaced, or `None` if no such member.
    ///
    /// The whole array is returned because the remote store has no
    /// field-level patch for embedded members.
    #[must_use]
    pub fn members_with_task(&self, email: &str, task: &str) -> Option<Vec<Member>> {
        self.member(email)?;
        Some(
            self.members
                .iter()
                .map(|m| {
                    if m.email == email {
                        Member {
                            task: task.to_string(),
                            ..m.clone()
                        }
                    } else {
                        m.clone()
                    }
                })
                .collect(),
        )
    }

    /// Map a snapshot document into the group shape
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields: GroupFields = serde_json::from_value(doc.fields.clone().into())?;
        Ok(Self {
            id: GroupId::new(doc.id.0.clone()),
            group_name: fields.group_name,
            members: fields.members,
        })
    }
}

/// Persisted shape of a group document (everything but the id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFields {
    #[serde(rename = "groupName")]
    pub group_name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl GroupFields {
    #[inline]
    #[must_use]
    pub fn new(group_name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            group_name: group_name.into(),
            members,
        }
    }

    /// Document fields for an add call
    pub fn to_fields(&self) -> Fields {
        to_fields(self)
    }
}

/// Fields for a members-only update
pub fn members_fields(members: &[Member]) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        "members".to_string(),
        serde_json::to_value(members).unwrap_or_default(),
    );
    fields
}

fn to_fields<T: Serialize>(value: &T) -> Fields {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => Fields::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn team() -> Group {
        Group::new(
            "g1",
            "Team1",
            vec![
                Member::new("Ann", "a@x.com"),
                Member::new("Bo", "b@x.com").with_task("Review"),
            ],
        )
    }

    #[test]
    fn members_with_task_replaces_only_target() {
        let members = team().members_with_task("a@x.com", "Write spec").unwrap();
        assert_eq!(members[0].task, "Write spec");
        assert_eq!(members[1].task, "Review");
    }

    #[test]
    fn members_with_task_unknown_email() {
        assert!(team().members_with_task("z@x.com", "x").is_none());
    }

    #[test]
    fn group_from_document() {
        let doc = Document::new(
            "abc",
            json!({
                "groupName": "Team1",
                "members": [{"name": "Ann", "email": "a@x.com", "task": ""}]
            }),
        );
        let group = Group::from_document(&doc).unwrap();
        assert_eq!(group.id, GroupId::new("abc"));
        assert_eq!(group.group_name, "Team1");
        assert_eq!(group.members, vec![Member::new("Ann", "a@x.com")]);
    }

    #[test]
    fn group_from_document_missing_members() {
        let doc = Document::new("abc", json!({ "groupName": "Empty" }));
        let group = Group::from_document(&doc).unwrap();
        assert!(group.members.is_empty());
    }

    #[test]
    fn group_from_document_missing_name_fails() {
        let doc = Document::new("abc", json!({ "members": [] }));
        assert!(Group::from_document(&doc).is_err());
    }

    #[test]
    fn group_fields_use_document_keys() {
        let fields = GroupFields::new("Team1", vec![Member::new("Ann", "a@x.com")]).to_fields();
        assert_eq!(fields["groupName"], json!("Team1"));
        assert_eq!(
            fields["members"],
            json!([{"name": "Ann", "email": "a@x.com", "task": ""}])
        );
    }

    #[test]
    fn members_fields_only_contains_members() {
        let fields = members_fields(&team().members);
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("members"));
    }
}
