//! Taskboard Core - group roster and task assignment state
//!
//! Keeps an in-memory view of task groups consistent with:
//! - A live full-collection subscription from the remote document store
//! - Locally issued optimistic mutations (assign/update/delete task,
//!   create/delete group)
//! - A single "expanded group" selection that must never go stale
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskboard_core::{BoardConfig, Dashboard, MemoryStore};
//!
//! # async fn example(prompter: Arc<dyn taskboard_core::Prompter>) {
//! let store = Arc::new(MemoryStore::new());
//! let mut dashboard = Dashboard::mount(store, prompter, BoardConfig::new()).await;
//!
//! dashboard.create_group("Team1", &["a@x.com".to_string()]).await;
//! let view = dashboard.render();
//! println!("{} groups", view.groups.len());
//!
//! dashboard.unmount().await;
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod dashboard;
pub mod error;
pub mod ops;
pub mod prompt;
pub mod roster;
pub mod selection;
pub mod store;
pub mod sync;
pub mod types;
pub mod view;

pub use config::BoardConfig;
pub use dashboard::{Dashboard, DashboardView, GroupPanel};
pub use error::{BoardError, ConfigError, ErrorKind, StoreError};
pub use ops::{MutationOps, PromptedOutcome};
pub use prompt::{Notice, PromptOutcome, Prompter, TextPrompt};
pub use roster::RosterCache;
pub use selection::SelectionTracker;
pub use store::{
    Document, DocumentId, Fields, MemoryStore, RemoteStore, Snapshot, SnapshotStream,
    SubscriptionGuard,
};
pub use sync::GroupSynchronizer;
pub use types::{Employee, Group, GroupId, Member};
pub use view::GroupView;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the task board
    pub use crate::{
        BoardConfig, BoardError, Dashboard, Employee, Group, GroupId, GroupSynchronizer,
        GroupView, Member, MemoryStore, MutationOps, Prompter, RemoteStore, RosterCache,
        SelectionTracker,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
