//! auth_session - Authentication session state machine
//!
//! Unifies two token-acquisition paths into one session consumed by the
//! UI and the sync engine: the in-browser interactive/silent OAuth flow
//! owned by the token broker, and a native-host bridge where the
//! surrounding shell owns the token and pushes it in via callback.

pub mod engine;
pub mod machine;
pub mod session;

pub use engine::SessionEngine;
pub use machine::{AuthEvent, AuthPhase, PhaseTransition, StateMachine};
pub use session::{DisplayState, Session};
