//! native_bridge - Contract for the host-provided native callback channel
//!
//! An embedded card may run inside a native mobile shell that owns the
//! user's session. The shell exposes a bidirectional callback channel:
//! the card registers named callbacks the host invokes, and asks the host
//! to perform named actions. When no shell is present the card receives a
//! no-op bridge and authentication falls back to the browser flow.

pub mod bridge;
pub mod host_channel;
pub mod message;
pub mod names;

pub use bridge::{BridgeHandler, NativeBridge, NoopBridge};
pub use host_channel::HostChannel;
pub use message::{parse_loading_flag, BridgeError, BridgeMessage};
