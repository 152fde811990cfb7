//! Auth phases - the authoritative lifecycle of the session

use serde::{Deserialize, Serialize};

/// Phases of the auth session lifecycle.
///
/// `Ready` is the steady state the machine re-enters after every
/// transition completes; there is no terminal phase, the machine cycles
/// for the lifetime of the UI session.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    /// Waiting for configuration and the first silent/bridge outcome.
    Initialize,

    /// Steady state; the UI can act on the session.
    Ready,

    /// Interactive login is running.
    DoLogin,

    /// Logout is running.
    DoLogout,

    /// Building the remote-API client handle from the current token.
    DoGraphInitialize,

    /// Provider signalled a background login (token refresh, account
    /// switch); re-initialize the client.
    EventLogin,

    /// Provider or host signalled a background logout.
    EventLogout,
}

impl Default for AuthPhase {
    fn default() -> Self {
        AuthPhase::Initialize
    }
}

impl AuthPhase {
    /// Phases the UI treats as ready for display.
    pub fn is_display_ready(self) -> bool {
        matches!(self, AuthPhase::Ready | AuthPhase::DoLogout)
    }

    /// Phases that are waiting on an asynchronous flow.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            AuthPhase::Initialize | AuthPhase::DoLogin | AuthPhase::DoGraphInitialize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_initialize() {
        assert_eq!(AuthPhase::default(), AuthPhase::Initialize);
    }

    #[test]
    fn display_ready_covers_ready_and_logout() {
        assert!(AuthPhase::Ready.is_display_ready());
        assert!(AuthPhase::DoLogout.is_display_ready());
        assert!(!AuthPhase::Initialize.is_display_ready());
        assert!(!AuthPhase::DoLogin.is_display_ready());
    }
}
