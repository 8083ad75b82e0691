//! Selection tracker
//!
//! Stores the id of the expanded group, never the record itself. The id is
//! resolved against the current view on every read, so a snapshot that
//! replaces the view cannot leave the selection pointing at stale data.

use crate::types::{Group, GroupId};
use crate::view::GroupView;

/// At most one selected group id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: Option<GroupId>,
}

impl SelectionTracker {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `id`, or deselect it if it is already selected.
    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: &GroupId) -> bool {
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
            false
        } else {
            self.selected = Some(id.clone());
            true
        }
    }

    /// Stored id, which may no longer exist in the view
    #[inline]
    #[must_use]
    pub fn selected_id(&self) -> Option<&GroupId> {
        self.selected.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_selected(&self, id: &GroupId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Clear only if `id` is the selection. Returns whether it was.
    pub fn clear_if(&mut self, id: &GroupId) -> bool {
        if self.is_selected(id) {
            self.selected = None;
            true
        } else {
            false
        }
    }

    /// Current record for the selection, or `None` if nothing is selected
    /// or the group no longer exists
    #[must_use]
    pub fn resolve(&self, view: &GroupView) -> Option<Group> {
        self.selected.as_ref().and_then(|id| view.get(id))
    }
}
