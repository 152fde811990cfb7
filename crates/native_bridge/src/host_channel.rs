//! In-memory host double
//!
//! Stands in for the native shell in tests and local harnesses: callbacks
//! registered by the card are kept in a registry and can be invoked by
//! name, and every `invoke_host` call is recorded for inspection.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::bridge::{BridgeHandler, NativeBridge};

/// Recorded host invocation.
#[derive(Debug, Clone)]
pub struct HostInvocation {
    pub action: String,
    pub payload: Value,
    pub expect_return: bool,
}

/// Native bridge backed by in-process registries.
#[derive(Default)]
pub struct HostChannel {
    callbacks: Mutex<HashMap<String, BridgeHandler>>,
    invocations: Mutex<Vec<HostInvocation>>,
}

impl HostChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke a registered callback the way the host would. Returns false
    /// when nothing is registered under `name`.
    pub fn invoke_callback(&self, name: &str, payload: Value) -> bool {
        let callbacks = self.callbacks.lock().unwrap_or_else(|e| e.into_inner());
        match callbacks.get(name) {
            Some(handler) => {
                handler(payload);
                true
            }
            None => false,
        }
    }

    /// Actions the card has asked the host to perform, in order.
    pub fn invocations(&self) -> Vec<HostInvocation> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn registered_callbacks(&self) -> Vec<String> {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

impl NativeBridge for HostChannel {
    fn register_callback(&self, name: &str, handler: BridgeHandler) {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), handler);
    }

    fn invoke_host(&self, action: &str, payload: Value, expect_return: bool) {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(HostInvocation {
                action: action.to_string(),
                payload,
                expect_return,
            });
    }

    fn is_native_host(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn invokes_registered_callback() {
        let channel = HostChannel::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();

        channel.register_callback(
            "mobileLogin",
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(channel.invoke_callback("mobileLogin", json!({})));
        assert!(channel.invoke_callback("mobileLogin", json!({})));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!channel.invoke_callback("unknown", json!({})));
    }

    #[test]
    fn records_host_invocations() {
        let channel = HostChannel::new();
        channel.invoke_host("acquireMobileToken", json!({"extName": "Card+School"}), false);

        let calls = channel.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].action, "acquireMobileToken");
        assert!(!calls[0].expect_return);
    }

    #[test]
    fn re_registration_replaces_handler() {
        let channel = HostChannel::new();
        let count = Arc::new(AtomicUsize::new(0));

        let first = count.clone();
        channel.register_callback("setLoading", Box::new(move |_| {
            first.fetch_add(1, Ordering::SeqCst);
        }));
        let second = count.clone();
        channel.register_callback("setLoading", Box::new(move |_| {
            second.fetch_add(10, Ordering::SeqCst);
        }));

        channel.invoke_callback("setLoading", json!(true));
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }
}
