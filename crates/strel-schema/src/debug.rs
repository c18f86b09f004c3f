//! # Debug Channel
//!
//! Validators emit diagnostics (malformed expectations, unsalvageable
//! fields) through a [`DebugChannel`]. The channel is gated by a
//! caller-supplied predicate that is consulted on every message, so an
//! application can toggle diagnostics at runtime. Messages go to a
//! caller-supplied sink, or to `tracing` at debug level when none is set.

use std::fmt;
use std::sync::Arc;

/// Gate consulted before every debug message.
pub type DebugEnabled = Arc<dyn Fn() -> bool + Send + Sync>;

/// Sink receiving a message and its structured context.
pub type LogDebugMessage = Arc<dyn Fn(&str, &serde_json::Value) + Send + Sync>;

#[derive(Clone)]
pub struct DebugChannel {
    enabled: DebugEnabled,
    sink: Option<LogDebugMessage>,
}

impl DebugChannel {
    pub fn new(enabled: DebugEnabled, sink: Option<LogDebugMessage>) -> Self {
        Self { enabled, sink }
    }

    /// A channel that never emits.
    pub fn disabled() -> Self {
        Self::new(Arc::new(|| false), None)
    }

    pub fn is_enabled(&self) -> bool {
        (self.enabled)()
    }

    /// Emit `message` if the channel is enabled. `context` is only built
    /// when the message is actually emitted.
    pub fn log(&self, message: &str, context: impl FnOnce() -> serde_json::Value) {
        if !self.is_enabled() {
            return;
        }
        let context = context();
        match &self.sink {
            Some(sink) => sink(message, &context),
            None => tracing::debug!(context = %context, "{message}"),
        }
    }
}

impl fmt::Debug for DebugChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugChannel")
            .field("custom_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_gate_is_consulted_per_message() {
        let on = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let gate = Arc::clone(&on);
        let sink_seen = Arc::clone(&seen);
        let channel = DebugChannel::new(
            Arc::new(move || gate.load(Ordering::SeqCst)),
            Some(Arc::new(move |m: &str, _: &serde_json::Value| {
                sink_seen.lock().push(m.to_string())
            })),
        );

        channel.log("first", || serde_json::Value::Null);
        on.store(true, Ordering::SeqCst);
        channel.log("second", || serde_json::json!({"k": 1}));

        assert_eq!(*seen.lock(), vec!["second".to_string()]);
    }

    #[test]
    fn test_context_not_built_when_disabled() {
        let channel = DebugChannel::disabled();
        channel.log("never", || panic!("context must not be built"));
        assert!(!channel.is_enabled());
    }
}
