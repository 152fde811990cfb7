//! task_sync - Task synchronization engine
//!
//! Polls the remote To Do API through the session's client handle,
//! merges and ranks tasks across lists, applies optimistic completion
//! toggles with rollback, and adapts its polling cadence to page
//! visibility.

pub mod engine;
pub mod state;

pub use engine::{SessionSource, TaskSyncEngine};
pub use state::SyncState;
