//! Auth events - everything that can drive a phase transition
//!
//! Two producer channels feed the same machine: broker outcomes from the
//! browser flow, and bridge callbacks pushed by the native host.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    // ========== Broker Outcomes ==========
    /// Silent acquisition produced a usable token.
    SilentAuthSucceeded,

    /// Silent acquisition failed. When a native host is attached the
    /// machine keeps waiting for the host's token push instead of
    /// settling into the signed-out ready state.
    SilentAuthFailed { native_host: bool },

    /// Interactive login completed with a token.
    LoginSucceeded,

    /// Interactive login failed or was cancelled by the user.
    LoginFailed,

    /// Logout finished (locally; revocation is best-effort).
    LogoutCompleted,

    // ========== User Actions ==========
    /// UI asked to sign in.
    LoginRequested,

    /// UI asked to sign out.
    LogoutRequested,

    // ========== Client Handle ==========
    /// The remote-API client handle was constructed.
    ClientInitialized,

    /// No usable token/configuration yet; stay put until one appears.
    ClientUnavailable,

    /// An event phase asked for the client to be (re)built.
    GraphInitializeRequested,

    /// Session state was cleared after a background logout.
    SessionCleared,

    // ========== Provider Listeners ==========
    /// Background login signal from the identity provider.
    ProviderLoginEvent,

    /// Background logout signal from the identity provider or host.
    ProviderLogoutEvent,

    // ========== Bridge Callbacks ==========
    /// A host token push was applied to the session.
    BridgeTokenApplied,

    /// Host reported it holds no session for this user.
    BridgeNoToken,

    /// Host reported its loading indicator finished.
    BridgeLoadingFinished,

    /// Host or provider reported an authentication error.
    AuthErrorReported,
}

impl AuthEvent {
    /// Check if this event originates from the native host bridge.
    pub fn is_bridge_event(&self) -> bool {
        matches!(
            self,
            Self::BridgeTokenApplied
                | Self::BridgeNoToken
                | Self::BridgeLoadingFinished
                | Self::AuthErrorReported
        )
    }

    /// Check if this event is user-initiated.
    pub fn is_user_event(&self) -> bool {
        matches!(self, Self::LoginRequested | Self::LogoutRequested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_event_detection() {
        assert!(AuthEvent::BridgeTokenApplied.is_bridge_event());
        assert!(AuthEvent::BridgeNoToken.is_bridge_event());
        assert!(!AuthEvent::LoginRequested.is_bridge_event());
    }

    #[test]
    fn user_event_detection() {
        assert!(AuthEvent::LoginRequested.is_user_event());
        assert!(!AuthEvent::SilentAuthSucceeded.is_user_event());
    }
}
