//! todo_core - Core types for the To Do card
//!
//! This crate provides the foundational types used across the card crates:
//! - `config` - card configuration (identity settings, link template)
//! - `task` - Task model mapped from remote To Do records
//! - `rank` - merge/sort/truncate policy for the displayed collection
//! - `link` - task link templating
//! - `visibility` - page visibility signal

pub mod config;
pub mod link;
pub mod rank;
pub mod task;
pub mod visibility;

// Re-export commonly used types
pub use config::CardConfig;
pub use link::task_link;
pub use rank::{merge_ranked, MAX_DISPLAY_TASKS};
pub use task::{Importance, Task, TaskStatus};
pub use visibility::Visibility;
