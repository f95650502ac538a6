//! Command implementations for the quill CLI
//!
//! Each command module handles the CLI interface and delegates to
//! quill-core for the actual work.

pub mod check;
pub mod definitions;
pub mod find;
pub mod render;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use quill_core::status::{CollectingNotifier, TracingNotifier};
use quill_core::{DefinitionSession, Settings, StatusEvent, StatusLevel, StatusNotifier};

/// Settings file looked up next to the input when none is given.
pub const SETTINGS_FILE_NAME: &str = "quill.yaml";

/// Logs status events and keeps them for the exit status.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    events: CollectingNotifier,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_count(&self) -> usize {
        self.events.at_least(StatusLevel::Error).len()
    }

    pub fn warning_count(&self) -> usize {
        self.events
            .events()
            .iter()
            .filter(|event| event.level == StatusLevel::Warning)
            .count()
    }
}

impl StatusNotifier for ConsoleNotifier {
    fn notify(&self, event: StatusEvent) {
        TracingNotifier.notify(event.clone());
        self.events.notify(event);
    }
}

/// Load `explicit`, or `quill.yaml` in the directory of `near` if present.
pub fn load_settings(explicit: Option<&Path>, near: &Path) -> Result<Settings> {
    match explicit {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => {
            let dir = near.parent().unwrap_or_else(|| Path::new("."));
            let path = dir.join(SETTINGS_FILE_NAME);
            Settings::load_or_default(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))
        }
    }
}

pub fn open_definitions(
    path: &Path,
    settings: &Settings,
    notifier: Arc<dyn StatusNotifier>,
) -> Result<DefinitionSession> {
    DefinitionSession::open(path, settings, notifier)
        .with_context(|| format!("Failed to read definitions from {}", path.display()))
}
