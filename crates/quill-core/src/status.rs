/*
 * status.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Fire-and-forget status channel for user-facing messages.
 */

//! Status notifications.
//!
//! Recoverable problems (a failed script expression, a malformed definition
//! tree, a stage that fell back to its input) are reported through a
//! [`StatusNotifier`] rather than returned as errors. The channel is
//! separate from `tracing`: logging is for developers, status events are
//! for whoever drives the pipeline.

use std::sync::{Mutex, PoisonError};

/// Severity of a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Info => "info",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub level: StatusLevel,
    pub message: String,
}

impl StatusEvent {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Receiver of status events.
///
/// Notification never fails and never blocks the caller for long.
pub trait StatusNotifier: Send + Sync {
    fn notify(&self, event: StatusEvent);

    fn info(&self, message: &str) {
        self.notify(StatusEvent::new(StatusLevel::Info, message));
    }

    fn warning(&self, message: &str) {
        self.notify(StatusEvent::new(StatusLevel::Warning, message));
    }

    fn error(&self, message: &str) {
        self.notify(StatusEvent::new(StatusLevel::Error, message));
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl StatusNotifier for NoopNotifier {
    fn notify(&self, _event: StatusEvent) {}
}

/// Forwards events to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl StatusNotifier for TracingNotifier {
    fn notify(&self, event: StatusEvent) {
        match event.level {
            StatusLevel::Info => tracing::info!(target: "quill::status", "{}", event.message),
            StatusLevel::Warning => tracing::warn!(target: "quill::status", "{}", event.message),
            StatusLevel::Error => tracing::error!(target: "quill::status", "{}", event.message),
        }
    }
}

/// Records every event in memory.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    events: Mutex<Vec<StatusEvent>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events at or above `level`.
    pub fn at_least(&self, level: StatusLevel) -> Vec<StatusEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level >= level)
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl StatusNotifier for CollectingNotifier {
    fn notify(&self, event: StatusEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_notifiers_are_send_sync() {
        assert_send_sync::<NoopNotifier>();
        assert_send_sync::<TracingNotifier>();
        assert_send_sync::<CollectingNotifier>();
    }

    #[test]
    fn test_collecting_notifier_records_in_order() {
        let notifier = CollectingNotifier::new();
        notifier.info("loaded");
        notifier.warning("slow");
        notifier.error("failed");

        let events = notifier.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], StatusEvent::new(StatusLevel::Info, "loaded"));
        assert_eq!(events[2].level, StatusLevel::Error);
    }

    #[test]
    fn test_at_least_filters_by_level() {
        let notifier = CollectingNotifier::new();
        notifier.info("a");
        notifier.warning("b");
        notifier.error("c");

        let serious = notifier.at_least(StatusLevel::Warning);
        assert_eq!(serious.len(), 2);
        assert_eq!(serious[0].message, "b");
    }

    #[test]
    fn test_clear() {
        let notifier = CollectingNotifier::new();
        notifier.info("a");
        notifier.clear();
        assert!(notifier.events().is_empty());
    }

    #[test]
    fn test_level_display() {
        assert_eq!(StatusLevel::Warning.to_string(), "warning");
    }
}
