/*
 * find.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Find command implementation
 */

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};

use quill_core::SearchMode;

use super::{ConsoleNotifier, load_settings, open_definitions};
use crate::Mode;

/// Arguments for the find command
#[derive(Debug)]
pub struct FindArgs {
    pub file: PathBuf,
    pub text: String,
    pub mode: Mode,
    pub settings: Option<PathBuf>,
}

impl From<Mode> for SearchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Exact => SearchMode::Exact,
            Mode::Contains => SearchMode::Contains,
            Mode::NoCase => SearchMode::ContainsNoCase,
            Mode::Prefix => SearchMode::StartsWith,
        }
    }
}

/// Execute the find command
///
/// Prints `path: value` for the first matching leaf.
pub fn execute(args: FindArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_deref(), &args.file)?;
    let session = open_definitions(&args.file, &settings, Arc::new(ConsoleNotifier::new()))?;
    let tree = session.tree();

    let Some(leaf) = tree.find_leaf(&args.text, args.mode.into()) else {
        bail!("No definition matches '{}'", args.text);
    };

    let path = tree.leaf_path(leaf).unwrap_or_default();
    println!("{path}: {}", tree.value(leaf));
    Ok(())
}
