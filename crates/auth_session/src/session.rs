//! Session - the single authoritative view of authentication state

use std::sync::Arc;

use graph_client::GraphClient;

use crate::machine::AuthPhase;

/// What the UI should render right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Ready,
    NotReady,
}

/// Snapshot of the auth session consumed by the UI and the sync engine.
///
/// Owned exclusively by the session engine; everyone else reads clones.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Pre-authenticated handle for the remote task API, present only
    /// while logged in.
    pub client: Option<Arc<GraphClient>>,
    pub error: bool,
    pub logged_in: bool,
    /// Page-level loading indicator driven by the host.
    pub loading: bool,
    /// Platform identifier reported by the native host, when known.
    pub platform: Option<String>,
    pub phase: AuthPhase,
}

impl Session {
    pub fn display_state(&self) -> DisplayState {
        if self.phase.is_display_ready() {
            DisplayState::Ready
        } else {
            DisplayState::NotReady
        }
    }
}
