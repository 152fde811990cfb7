//! Bridge trait and the absent-capability implementation

use serde_json::Value;

/// Handler invoked by the host under a registered callback name.
///
/// The host may re-invoke a callback at any time with stale or duplicate
/// data; handlers must be idempotent over repeated identical payloads.
pub type BridgeHandler = Box<dyn Fn(Value) + Send + Sync>;

/// Capability contract for the native host channel.
///
/// Delivery is at-most-once per logical event, but nothing prevents the
/// host from pushing the same payload twice. `invoke_host` never returns
/// a value; when `expect_return` is set the host answers asynchronously
/// through a registered callback instead.
pub trait NativeBridge: Send + Sync {
    /// Register `handler` to be invoked by the host under `name`.
    fn register_callback(&self, name: &str, handler: BridgeHandler);

    /// Ask the host to perform `action` with `payload`.
    fn invoke_host(&self, action: &str, payload: Value, expect_return: bool);

    /// Capability probe: true when a native shell is actually attached.
    fn is_native_host(&self) -> bool;
}

/// Bridge used when the card runs in a plain browser tab.
///
/// Registration and invocation are no-ops, so call sites never need to
/// probe for the capability themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBridge;

impl NativeBridge for NoopBridge {
    fn register_callback(&self, _name: &str, _handler: BridgeHandler) {}

    fn invoke_host(&self, action: &str, _payload: Value, _expect_return: bool) {
        log::debug!("no native host, dropping action {action}");
    }

    fn is_native_host(&self) -> bool {
        false
    }
}
