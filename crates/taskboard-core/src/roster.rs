//! Roster cache
//!
//! Employees are read once per session with a single `read_all` and never
//! refreshed. Everything downstream treats the roster as read-only.

use crate::error::BoardError;
use crate::store::RemoteStore;
use crate::types::{Employee, Member};
use std::collections::HashSet;

/// Immutable snapshot of the employee roster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterCache {
    employees: Vec<Employee>,
    loaded: bool,
}

impl RosterCache {
    /// Roster that has not been (or could not be) loaded
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Roster from known employees
    #[inline]
    #[must_use]
    pub fn from_employees(employees: Vec<Employee>) -> Self {
        Self {
            employees,
            loaded: true,
        }
    }

    /// Fetch the roster from `collection`
    ///
    /// # Errors
    /// - `BoardError::Fetch` if the read fails
    pub async fn load(store: &dyn RemoteStore, collection: &str) -> Result<Self, BoardError> {
        let documents = store.read_all(collection).await.map_err(|e| {
            tracing::error!("Error fetching employees data: {}", e);
            BoardError::fetch("Failed to fetch employees data", e)
        })?;

        let mut employees = Vec::with_capacity(documents.len());
        for doc in documents {
            match serde_json::from_value::<Employee>(doc.fields.into()) {
                Ok(employee) => employees.push(employee),
                Err(e) => tracing::warn!("Skipping malformed employee {}: {}", doc.id, e),
            }
        }

        tracing::debug!("Loaded {} employees", employees.len());
        Ok(Self::from_employees(employees))
    }

    #[inline]
    #[must_use]
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Whether a fetch succeeded
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// First employee with this email
    #[must_use]
    pub fn find(&self, email: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.email == email)
    }

    /// Resolve selected emails into unassigned members, in selection order
    ///
    /// # Errors
    /// - `BoardError::Validation` naming the first unknown or repeated email
    pub fn resolve_members(&self, emails: &[String]) -> Result<Vec<Member>, BoardError> {
        let mut seen = HashSet::with_capacity(emails.len());
        emails
            .iter()
            .map(|email| {
                if !seen.insert(email.as_str()) {
                    return Err(BoardError::validation(format!("Duplicate member: {email}")));
                }
                self.find(email)
                    .map(Employee::to_member)
                    .ok_or_else(|| BoardError::validation(format!("Unknown employee: {email}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, StoreError};
    use crate::store::{Document, MockRemoteStore};
    use serde_json::json;

    fn roster() -> RosterCache {
        RosterCache::from_employees(vec![
            Employee::new("Ann", "a@x.com"),
            Employee::new("Bo", "b@x.com"),
        ])
    }

    #[test]
    fn resolve_members_keeps_selection_order() {
        let members = roster()
            .resolve_members(&["b@x.com".to_string(), "a@x.com".to_string()])
            .unwrap();
        assert_eq!(members[0].name, "Bo");
        assert_eq!(members[1].name, "Ann");
        assert!(members.iter().all(|m| m.task.is_empty()));
    }

    #[test]
    fn resolve_members_unknown_email() {
        let err = roster()
            .resolve_members(&["a@x.com".to_string(), "z@x.com".to_string()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.user_message().contains("z@x.com"));
    }

    #[test]
    fn resolve_members_rejects_repeated_email() {
        let err = roster()
            .resolve_members(&[
                "a@x.com".to_string(),
                "b@x.com".to_string(),
                "a@x.com".to_string(),
            ])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "Duplicate member: a@x.com");
    }

    #[tokio::test]
    async fn load_reads_once_and_skips_malformed() {
        let mut store = MockRemoteStore::new();
        store.expect_read_all().times(1).returning(|_| {
            Ok(vec![
                Document::new("1", json!({"name": "Ann", "email": "a@x.com"})),
                Document::new("2", json!({"name": "NoEmail"})),
            ])
        });

        let roster = RosterCache::load(&store, "employees").await.unwrap();
        assert!(roster.is_loaded());
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.find("a@x.com").unwrap().name, "Ann");
    }

    #[tokio::test]
    async fn load_failure_is_fetch_error() {
        let mut store = MockRemoteStore::new();
        store
            .expect_read_all()
            .returning(|_| Err(StoreError::Unavailable("offline".to_string())));

        let err = RosterCache::load(&store, "employees").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(err.user_message(), "Failed to fetch employees data");
    }

    #[test]
    fn empty_roster_is_not_loaded() {
        assert!(!RosterCache::empty().is_loaded());
    }
}
