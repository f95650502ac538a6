/*
 * pipeline_integration.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end tests of definitions, chains and exports.
 */

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use quill_core::processor::{PreviewSink, StageError, Typesetter, XsltTransformer};
use quill_core::status::CollectingNotifier;
use quill_core::{
    DefinitionSession, ExportFormat, ExportWorker, Output, ProcessorContext, ProcessorKind,
    ScriptContext, ScriptError, ScriptEvaluator, Settings, SourceKind, StatusLevel,
    create_processors,
};

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Default)]
struct RecordingPreview(Mutex<Vec<String>>);

impl PreviewSink for RecordingPreview {
    fn render(&self, html: &str) {
        self.0.lock().unwrap().push(html.to_string());
    }
}

/// Adds two integers; anything else fails like an R syntax error.
struct SumEvaluator {
    calls: Arc<AtomicUsize>,
}

impl ScriptEvaluator for SumEvaluator {
    fn name(&self) -> &str {
        "sum"
    }

    fn evaluate(&mut self, expression: &str) -> Result<String, ScriptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let parts: Option<Vec<i64>> = expression
            .split('+')
            .map(|part| part.trim().trim_matches('\'').parse().ok())
            .collect();
        match parts {
            Some(numbers) => Ok(numbers.iter().sum::<i64>().to_string()),
            None => Err(ScriptError::evaluation_failed(expression, "unexpected symbol")),
        }
    }
}

/// Writes the XHTML it receives to the output path.
struct FileTypesetter;

impl Typesetter for FileTypesetter {
    fn typeset(&self, document: &str, output: &Path) -> Result<(), StageError> {
        std::fs::write(output, document).map_err(|e| StageError::io("typeset", e))
    }
}

/// Replaces the document with a Markdown heading naming the stylesheet.
struct NamingXslt;

impl XsltTransformer for NamingXslt {
    fn transform(&self, _document: &str, stylesheet: &Path) -> Result<String, StageError> {
        let name = stylesheet
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("# Styled by {name}\n"))
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn resolved(&self, name: &str, yaml: &str) -> Arc<quill_core::DefinitionMap> {
        let path = self.write(name, yaml);
        let mut session = DefinitionSession::open(
            &path,
            &Settings::default(),
            Arc::new(CollectingNotifier::new()),
        )
        .unwrap();
        session.resolve().unwrap()
    }
}

// ============================================================================
// Definitions
// ============================================================================

#[test]
fn test_definitions_scenario_end_to_end() {
    let ws = Workspace::new();
    let definitions = ws.resolved("definitions.yaml", "a:\n  b: \"1\"\n  c: \"${a.b}2\"\n");
    assert_eq!(definitions["a.b"], "1");
    assert_eq!(definitions["a.c"], "12");

    let input = ws.write("doc.md", "x = ${a.c} done");
    let ctx = ProcessorContext::for_path(&input, Arc::new(Settings::default()))
        .with_definitions(definitions)
        .with_export(ExportFormat::Markdown, None);

    let output = create_processors(&ctx).unwrap().apply("x = ${a.c} done");
    assert_eq!(output, Output::Text("x = 12 done".to_string()));
}

#[test]
fn test_unknown_reference_stays_visible_in_document() {
    let ctx = ProcessorContext::new(SourceKind::Markdown, ExportFormat::Markdown);
    let output = create_processors(&ctx).unwrap().apply("${missing.key}");
    assert_eq!(output.text(), Some("${missing.key}"));
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn test_markdown_preview_reaches_sink() {
    let preview = Arc::new(RecordingPreview::default());
    let ctx = ProcessorContext::new(SourceKind::Markdown, ExportFormat::None)
        .with_preview(preview.clone())
        .with_caret(quill_core::processor::Caret::new(2));

    let html = create_processors(&ctx)
        .unwrap()
        .apply("hello *world*")
        .into_text()
        .unwrap();

    assert_eq!(
        html,
        "<p>he<span id=\"caret\"></span>llo <em>world</em></p>\n"
    );
    assert_eq!(*preview.0.lock().unwrap(), vec![html]);
}

#[test]
fn test_plain_text_preview_is_escaped() {
    let preview = Arc::new(RecordingPreview::default());
    let ctx = ProcessorContext::new(SourceKind::Plain, ExportFormat::None)
        .with_preview(preview.clone());

    let html = create_processors(&ctx).unwrap().apply("a < b").into_text().unwrap();
    assert!(html.contains("a &lt; b"));
    assert!(html.starts_with("<pre>"));
}

// ============================================================================
// R Markdown
// ============================================================================

#[test]
fn test_r_markdown_evaluates_with_definitions() {
    let ws = Workspace::new();
    let definitions = ws.resolved("definitions.yaml", "count:\n  base: \"40\"\n");
    let calls = Arc::new(AtomicUsize::new(0));
    let script = ScriptContext::new(Box::new(SumEvaluator {
        calls: calls.clone(),
    }));

    let ctx = ProcessorContext::new(SourceKind::RMarkdown, ExportFormat::Html)
        .with_definitions(definitions)
        .with_script(script.clone());
    let chain = create_processors(&ctx).unwrap();
    assert_eq!(
        chain.kinds(),
        vec![
            ProcessorKind::Definition,
            ProcessorKind::ScriptVariable,
            ProcessorKind::Script,
            ProcessorKind::Markdown,
        ]
    );

    let html = chain
        .apply("Total: `r v$count$base + 2`, again `r v$count$base + 2`.")
        .into_text()
        .unwrap();
    assert_eq!(html, "<p>Total: 42, again 42.</p>\n");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(script.is_cached("'40' + 2"));
}

#[test]
fn test_failed_expression_is_kept_and_reported() {
    let notifier = Arc::new(CollectingNotifier::new());
    let script = ScriptContext::new(Box::new(SumEvaluator {
        calls: Arc::new(AtomicUsize::new(0)),
    }));
    let ctx = ProcessorContext::new(SourceKind::RMarkdown, ExportFormat::Markdown)
        .with_notifier(notifier.clone())
        .with_script(script);

    let text = create_processors(&ctx)
        .unwrap()
        .apply("a `r nope()` b `r 1+1`")
        .into_text()
        .unwrap();
    assert_eq!(text, "a `r nope()` b 2");
    assert_eq!(notifier.at_least(StatusLevel::Warning).len(), 1);
}

#[test]
fn test_removing_script_stage_leaves_expressions() {
    let script = ScriptContext::new(Box::new(SumEvaluator {
        calls: Arc::new(AtomicUsize::new(0)),
    }));
    let ctx = ProcessorContext::new(SourceKind::RMarkdown, ExportFormat::Markdown)
        .with_script(script);

    let chain = create_processors(&ctx).unwrap();
    let without = chain.remove(ProcessorKind::Script);
    assert_eq!(
        without.kinds(),
        vec![
            ProcessorKind::Definition,
            ProcessorKind::ScriptVariable,
            ProcessorKind::Identity,
        ]
    );
    assert_eq!(without.apply("`r 1+1`").text(), Some("`r 1+1`"));
    assert_eq!(chain.len(), 4);
}

// ============================================================================
// XML
// ============================================================================

#[test]
fn test_xml_stylesheet_resolves_next_to_document() {
    let ws = Workspace::new();
    let document = "<?xml version=\"1.0\"?>\n\
        <?xml-stylesheet type=\"text/xsl\" href=\"book.xsl\"?>\n<book/>\n";
    let input = ws.write("book.xml", document);

    let ctx = ProcessorContext::for_path(&input, Arc::new(Settings::default()))
        .with_export(ExportFormat::Html, None)
        .with_xslt(Arc::new(NamingXslt));
    assert_eq!(ctx.source_kind, SourceKind::Xml);

    let html = create_processors(&ctx).unwrap().apply(document).into_text().unwrap();
    assert_eq!(html, "<h1>Styled by book.xsl</h1>\n");
}

#[test]
fn test_xml_without_stylesheet_falls_back_to_input() {
    let notifier = Arc::new(CollectingNotifier::new());
    let ctx = ProcessorContext::new(SourceKind::Xml, ExportFormat::Html)
        .with_notifier(notifier.clone())
        .with_xslt(Arc::new(NamingXslt));

    let html = create_processors(&ctx).unwrap().apply("plain words").into_text().unwrap();
    assert_eq!(html, "<p>plain words</p>\n");
    assert_eq!(notifier.at_least(StatusLevel::Error).len(), 1);
}

// ============================================================================
// Exports
// ============================================================================

#[test]
fn test_pdf_export_on_worker() {
    let ws = Workspace::new();
    let definitions = ws.resolved("definitions.yaml", "document:\n  title: Field Guide\n");
    let output_path = ws.dir.path().join("guide.pdf");
    let notifier = Arc::new(CollectingNotifier::new());

    let ctx = ProcessorContext::new(SourceKind::Markdown, ExportFormat::Pdf)
        .with_definitions(definitions)
        .with_notifier(notifier.clone())
        .with_typesetter(Arc::new(FileTypesetter))
        .with_export(ExportFormat::Pdf, Some(output_path.clone()));
    let chain = create_processors(&ctx).unwrap();

    let worker = ExportWorker::new(notifier.clone()).unwrap();
    let handle = worker
        .submit("guide.pdf", move || Ok(chain.apply("# ${document.title}")))
        .unwrap();
    assert_eq!(handle.wait().unwrap(), Output::Written(output_path.clone()));
    worker.shutdown().unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    assert!(written.contains("<title>Field Guide</title>"));
    assert!(written.contains("<h1>Field Guide</h1>"));
    assert!(
        notifier
            .events()
            .iter()
            .any(|e| e.message.starts_with("Exported guide.pdf"))
    );
}

#[test]
fn test_output_path_for_formats() {
    let input = Path::new("/docs/chapter.md");
    assert_eq!(
        ExportFormat::Html.output_path(input),
        PathBuf::from("/docs/chapter.html")
    );
    assert_eq!(
        ExportFormat::Markdown.output_path(input),
        PathBuf::from("/docs/chapter.out.md")
    );
}
