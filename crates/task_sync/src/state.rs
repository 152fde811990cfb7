//! Sync engine states

use serde::{Deserialize, Serialize};

/// Lifecycle of the task collection.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// First fetch for this login has not completed yet.
    Load,
    /// A re-fetch has been requested.
    Refresh,
    /// The collection reflects the last successful fetch.
    Loaded,
    /// The last overall fetch failed; the collection may be stale.
    Error,
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Load
    }
}

impl SyncState {
    /// States from which a periodic or visibility-driven refresh makes
    /// sense.
    pub fn is_settled(self) -> bool {
        matches!(self, SyncState::Loaded | SyncState::Error)
    }
}
