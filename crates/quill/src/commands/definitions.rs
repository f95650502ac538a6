/*
 * definitions.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Definitions command implementation
 */

//! Print a definitions file as a flat, sorted map.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;

use super::{ConsoleNotifier, load_settings, open_definitions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Yaml,
    Json,
}

/// Arguments for the definitions command
#[derive(Debug)]
pub struct DefinitionsArgs {
    pub file: PathBuf,
    pub raw: bool,
    pub format: Format,
    pub settings: Option<PathBuf>,
}

/// Execute the definitions command
pub fn execute(args: DefinitionsArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_deref(), &args.file)?;
    let notifier = Arc::new(ConsoleNotifier::new());
    let mut session = open_definitions(&args.file, &settings, notifier)?;

    let map: BTreeMap<String, String> = if args.raw {
        session.flat_map().into_iter().collect()
    } else {
        let resolved = session
            .resolve()
            .with_context(|| format!("Failed to resolve {}", args.file.display()))?;
        resolved
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    };

    let text = match args.format {
        Format::Yaml => serde_yaml::to_string(&map)?,
        Format::Json => serde_json::to_string_pretty(&map)? + "\n",
    };
    print!("{text}");
    Ok(())
}
