/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! This module implements the `quill render` command. Without an export
//! format the preview HTML is printed to stdout; with one, the export runs
//! on the background export worker and is written next to the input (or to
//! `--output`).
//!
//! Optional external tools are discovered on demand:
//! - Rscript for R Markdown and R XML (missing R leaves expressions as is)
//! - xsltproc for XML documents
//! - ConTeXt for PDF exports

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, warn};

use quill_core::processor::{Caret, CommandTypesetter, PreviewSink, XsltprocTransformer};
use quill_core::script::{RscriptEvaluator, UnavailableEvaluator};
use quill_core::{
    DefinitionMap, ExportFormat, ExportWorker, Output, ProcessorChain, ProcessorContext,
    QuillError, ScriptContext, ScriptEvaluator, Settings, create_processors,
};

use super::{ConsoleNotifier, load_settings, open_definitions};

/// Definitions file looked up next to the input when none is given.
pub const DEFINITIONS_FILE_NAME: &str = "definitions.yaml";

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Input document
    pub input: PathBuf,
    /// Definitions file
    pub definitions: Option<PathBuf>,
    /// Export format
    pub to: String,
    /// Output file path
    pub output: Option<PathBuf>,
    /// Settings file
    pub settings: Option<PathBuf>,
    /// Caret offset for the preview
    pub caret: Option<usize>,
}

/// Preview sink that prints the HTML to stdout.
struct StdoutPreview;

impl PreviewSink for StdoutPreview {
    fn render(&self, html: &str) {
        print!("{html}");
    }
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let format = ExportFormat::try_from(args.to.as_str()).map_err(|e| anyhow!(e))?;
    let input = args.input.as_path();
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }

    let settings = Arc::new(load_settings(args.settings.as_deref(), input)?);
    let notifier = Arc::new(ConsoleNotifier::new());

    let definitions = resolve_definitions(
        args.definitions.as_deref(),
        input,
        &settings,
        notifier.clone(),
    )?;

    let output_path = args.output.clone().unwrap_or_else(|| format.output_path(input));
    let mut ctx = ProcessorContext::for_path(input, settings.clone())
        .with_definitions(definitions)
        .with_notifier(notifier.clone())
        .with_export(format, Some(output_path.clone()))
        .with_caret(Caret::new(args.caret.unwrap_or(0)));

    info!(
        input = %input.display(),
        kind = %ctx.source_kind,
        format = %format,
        "Rendering"
    );

    if ctx.source_kind.is_scripted() {
        let script = script_context(&ctx.working_dir, &settings);
        ctx = ctx.with_script(script);
    }
    if ctx.source_kind.is_xml() {
        match XsltprocTransformer::discover() {
            Some(xslt) => ctx = ctx.with_xslt(Arc::new(xslt)),
            None => warn!("xsltproc not found on PATH"),
        }
    }
    if format.is_typeset() {
        match CommandTypesetter::context() {
            Some(typesetter) => ctx = ctx.with_typesetter(Arc::new(typesetter)),
            None => warn!("ConTeXt not found on PATH"),
        }
    }
    if format == ExportFormat::None {
        ctx = ctx.with_preview(Arc::new(StdoutPreview));
    }

    let chain = create_processors(&ctx).context("Cannot render this document")?;
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    if format == ExportFormat::None {
        // The preview sink has already printed the result.
        chain.apply(text);
    } else {
        export(chain, text, format, &output_path, notifier.clone())?;
    }

    let errors = notifier.error_count();
    if errors > 0 {
        bail!("Rendering {} reported {errors} error(s)", input.display());
    }
    Ok(())
}

/// Load and interpolate the definitions for `input`.
///
/// Without an explicit file, `definitions.yaml` next to the input is used
/// when present; otherwise the document has no definitions.
fn resolve_definitions(
    explicit: Option<&Path>,
    input: &Path,
    settings: &Settings,
    notifier: Arc<ConsoleNotifier>,
) -> Result<Arc<DefinitionMap>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = input
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFINITIONS_FILE_NAME);
            if !candidate.is_file() {
                debug!("No definitions file; rendering without definitions");
                return Ok(Arc::new(DefinitionMap::new()));
            }
            candidate
        }
    };

    let mut session = open_definitions(&path, settings, notifier)?;
    session
        .resolve()
        .with_context(|| format!("Failed to resolve definitions in {}", path.display()))
}

fn script_context(working_dir: &Path, settings: &Settings) -> ScriptContext {
    let evaluator: Box<dyn ScriptEvaluator> = match RscriptEvaluator::discover(working_dir) {
        Ok(evaluator) => Box::new(evaluator),
        Err(e) => {
            warn!(error = %e, "Inline R expressions will not be evaluated");
            Box::new(UnavailableEvaluator::new(e.to_string()))
        }
    };
    ScriptContext::with_capacity(evaluator, settings.r.cache_capacity)
}

fn export(
    chain: ProcessorChain,
    text: String,
    format: ExportFormat,
    output_path: &Path,
    notifier: Arc<ConsoleNotifier>,
) -> Result<()> {
    let worker = ExportWorker::new(notifier)?;
    let target = output_path.to_path_buf();
    let name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| output_path.display().to_string());

    let handle = worker.submit(name, move || match chain.apply(text) {
        // The typesetter failed and the chain fell back to its input.
        Output::Text(_) if format.is_typeset() => Err(QuillError::other(format!(
            "{} was not written",
            target.display()
        ))),
        Output::Text(result) => {
            std::fs::write(&target, result).map_err(QuillError::from)?;
            Ok(Output::Written(target))
        }
        written @ Output::Written(_) => Ok(written),
    })?;

    let output = handle.wait();
    worker.shutdown()?;

    if let Output::Written(path) = output? {
        println!("Output created: {}", path.display());
    }
    Ok(())
}
