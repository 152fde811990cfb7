//! Phase transitions - the event-driven transition table

use super::events::AuthEvent;
use super::phases::AuthPhase;

/// Represents a phase transition result.
#[derive(Debug, Clone)]
pub struct PhaseTransition {
    /// The phase before the transition.
    pub from: AuthPhase,
    /// The phase after the transition.
    pub to: AuthPhase,
    /// The event that triggered the transition.
    pub event: AuthEvent,
    /// Whether the phase actually changed.
    pub changed: bool,
}

/// State machine for the auth session lifecycle.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current_phase: AuthPhase,
    /// Transition history (limited).
    history: Vec<PhaseTransition>,
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new machine in the initialize phase.
    pub fn new() -> Self {
        Self {
            current_phase: AuthPhase::Initialize,
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Create a machine with a specific initial phase.
    pub fn with_phase(phase: AuthPhase) -> Self {
        Self {
            current_phase: phase,
            history: Vec::new(),
            max_history: 50,
        }
    }

    pub fn phase(&self) -> AuthPhase {
        self.current_phase
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    /// Handle an event and transition to a new phase.
    pub fn handle_event(&mut self, event: AuthEvent) -> PhaseTransition {
        let old_phase = self.current_phase;
        let new_phase = Self::compute_next_phase(old_phase, &event);
        let changed = old_phase != new_phase;

        self.current_phase = new_phase;

        let transition = PhaseTransition {
            from: old_phase,
            to: new_phase,
            event,
            changed,
        };

        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    /// Compute the next phase given the current phase and an event.
    fn compute_next_phase(phase: AuthPhase, event: &AuthEvent) -> AuthPhase {
        use AuthEvent::*;
        use AuthPhase::*;

        match (phase, event) {
            // ========== Initialize ==========
            (Initialize, SilentAuthSucceeded) => DoGraphInitialize,
            (Initialize, SilentAuthFailed { native_host: false }) => Ready,
            // A native host owns the token; its asynchronous push drives
            // the transition instead.
            (Initialize, SilentAuthFailed { native_host: true }) => Initialize,

            // ========== User Actions ==========
            (_, LoginRequested) => DoLogin,
            (_, LogoutRequested) => DoLogout,

            // ========== Login / Logout ==========
            (DoLogin, LoginSucceeded) => DoGraphInitialize,
            (DoLogin, LoginFailed) => Ready,
            (DoLogout, LogoutCompleted) => Ready,

            // ========== Client Handle ==========
            (DoGraphInitialize, ClientInitialized) => Ready,
            // Silent no-op: stay until configuration/token appear.
            (DoGraphInitialize, ClientUnavailable) => DoGraphInitialize,

            // ========== Provider Listeners ==========
            (_, ProviderLoginEvent) => EventLogin,
            (EventLogin, GraphInitializeRequested) => DoGraphInitialize,
            (_, ProviderLogoutEvent) => EventLogout,
            (EventLogout, SessionCleared) => Ready,

            // ========== Bridge Callbacks ==========
            (_, BridgeTokenApplied) => Ready,
            (_, BridgeNoToken) => Ready,
            (_, BridgeLoadingFinished) => Ready,
            (_, AuthErrorReported) => Ready,

            // ========== Default: No transition ==========
            _ => phase,
        }
    }

    /// Check whether an event would change the phase, without executing.
    pub fn can_transition(&self, event: &AuthEvent) -> bool {
        Self::compute_next_phase(self.current_phase, event) != self.current_phase
    }
}
