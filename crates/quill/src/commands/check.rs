/*
 * check.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Check command implementation
 */

//! Validate settings and definitions without rendering anything.
//!
//! Malformed branches are reported as warnings; reference cycles and
//! unreadable files are errors.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use super::{ConsoleNotifier, load_settings, open_definitions};

/// Arguments for the check command
#[derive(Debug)]
pub struct CheckArgs {
    pub file: PathBuf,
    pub settings: Option<PathBuf>,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_deref(), &args.file)?;
    let notifier = Arc::new(ConsoleNotifier::new());
    let mut session = open_definitions(&args.file, &settings, notifier.clone())?;

    // Errors are already reported through the notifier.
    let resolved = session.resolve().ok();

    let errors = notifier.error_count();
    let warnings = notifier.warning_count();
    if errors > 0 {
        bail!(
            "{}: {errors} error(s), {warnings} warning(s)",
            args.file.display()
        );
    }

    info!(
        definitions = resolved.map_or(0, |map| map.len()),
        warnings,
        "{} is valid",
        args.file.display()
    );
    println!("{}: ok ({warnings} warning(s))", args.file.display());
    Ok(())
}
