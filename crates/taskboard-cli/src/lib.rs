//! Taskboard driver
//!
//! Runs the board headless against an in-memory store:
//! - `seed`: TOML seed files for the roster and initial groups
//! - `script`: TOML `[[step]]` lists of user actions
//! - `replay`: mounts a dashboard and applies a script through it
//! - `render`: text output of the final board

#![allow(missing_docs)]

pub mod prompter;
pub mod render;
pub mod replay;
pub mod script;
pub mod seed;

pub use prompter::ScriptPrompter;
pub use render::render_text;
pub use replay::{run, ReplayReport, StepReport};
pub use script::{Script, Step};
pub use seed::{SeedFile, SeedGroup};
