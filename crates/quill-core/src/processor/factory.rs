/*
 * processor/factory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Assembly of processor chains from a context.
 */

//! Chain assembly.
//!
//! The chain is a pure function of the context's source kind and export
//! format. Every chain starts with definition substitution:
//!
//! | Source kind      | Head                                        |
//! |------------------|---------------------------------------------|
//! | Markdown, other  | Definition                                  |
//! | R Markdown       | Definition, ScriptVariable, Script          |
//! | XML              | Definition, Xml                             |
//! | R XML            | Definition, ScriptVariable, Script, Xml     |
//!
//! The tail depends on whether the head produces Markdown:
//!
//! | Export   | Markdown-producing kinds                         | Other kinds             |
//! |----------|--------------------------------------------------|-------------------------|
//! | none     | CaretInsertion, Markdown, CaretReplacement, Preview | Preformatted, Preview |
//! | html     | Markdown                                         | Preformatted            |
//! | xhtml    | Markdown, Xhtml                                  | Preformatted, Xhtml     |
//! | markdown | Identity                                         | Identity                |
//! | pdf      | Markdown, Xhtml, Typeset                         | Preformatted, Xhtml, Typeset |

use std::sync::Arc;

use super::caret::{CaretInsertionProcessor, CaretReplacementProcessor};
use super::chain::ProcessorChain;
use super::context::ProcessorContext;
use super::definition::{DefinitionProcessor, IdentityProcessor};
use super::error::FactoryError;
use super::markdown::MarkdownProcessor;
use super::preformatted::PreformattedProcessor;
use super::preview::PreviewProcessor;
use super::typeset::TypesetProcessor;
use super::xhtml::{DOCUMENT_TITLE_KEY, XhtmlProcessor};
use super::Processor;
use super::xml::XmlProcessor;
use crate::format::ExportFormat;
use crate::script::{ScriptContext, ScriptProcessor, ScriptVariableProcessor, prepare_bootstrap};

/// Builds processor chains.
pub struct ProcessorFactory<'a> {
    context: &'a ProcessorContext,
}

impl<'a> ProcessorFactory<'a> {
    pub fn new(context: &'a ProcessorContext) -> Self {
        Self { context }
    }

    fn chain_name(&self) -> String {
        format!(
            "{} to {}",
            self.context.source_kind, self.context.export_format
        )
    }

    /// Build the chain for the context.
    ///
    /// Fails when a collaborator the chain needs is missing. For R kinds the
    /// configured bootstrap script is run here; its failure is reported
    /// through the notifier and does not prevent the chain from being built.
    pub fn create(&self) -> Result<ProcessorChain, FactoryError> {
        let ctx = self.context;
        let kind = ctx.source_kind;
        let format = ctx.export_format;

        let mut chain = ProcessorChain::new(ctx.notifier.clone());
        chain.push(Arc::new(DefinitionProcessor::new(
            &ctx.definitions,
            &ctx.settings.definition_operator(),
        )));

        if kind.is_scripted() {
            let script = ctx
                .script
                .clone()
                .ok_or_else(|| FactoryError::missing(self.chain_name(), "a script context"))?;
            self.bootstrap(&script);
            chain.push(Arc::new(ScriptVariableProcessor::new(
                &ctx.definitions,
                &ctx.settings.script_operator(),
            )));
            chain.push(Arc::new(ScriptProcessor::new(
                ctx.settings.r.inline.clone(),
                script,
                ctx.notifier.clone(),
            )));
        }

        if kind.is_xml() {
            let xslt = ctx
                .xslt
                .clone()
                .ok_or_else(|| FactoryError::missing(self.chain_name(), "an XSLT transformer"))?;
            chain.push(Arc::new(XmlProcessor::new(ctx.base_dir(), xslt)));
        }

        chain.extend(self.tail(kind.is_markup(), format)?);

        tracing::info!(
            source = %kind,
            export = %format,
            processors = %chain.describe(),
            "Built processor chain"
        );
        Ok(chain)
    }

    fn tail(
        &self,
        markup: bool,
        format: ExportFormat,
    ) -> Result<Vec<Arc<dyn Processor>>, FactoryError> {
        let ctx = self.context;
        let html: Arc<dyn Processor> = if markup {
            Arc::new(MarkdownProcessor::new())
        } else {
            Arc::new(PreformattedProcessor)
        };

        let tail: Vec<Arc<dyn Processor>> = match format {
            ExportFormat::None => {
                let sink = ctx
                    .preview
                    .clone()
                    .ok_or_else(|| FactoryError::missing(self.chain_name(), "a preview sink"))?;
                let preview: Arc<dyn Processor> = Arc::new(PreviewProcessor::new(sink));
                if markup {
                    vec![
                        Arc::new(CaretInsertionProcessor::new(ctx.caret.clone())),
                        html,
                        Arc::new(CaretReplacementProcessor),
                        preview,
                    ]
                } else {
                    vec![html, preview]
                }
            }
            ExportFormat::Markdown => vec![Arc::new(IdentityProcessor)],
            ExportFormat::Html | ExportFormat::Xhtml | ExportFormat::Pdf => {
                let mut tail = vec![html];
                if format.is_complete_document() {
                    tail.push(Arc::new(self.xhtml()));
                }
                if format.is_typeset() {
                    let typesetter = ctx
                        .typesetter
                        .clone()
                        .ok_or_else(|| FactoryError::missing(self.chain_name(), "a typesetter"))?;
                    let output = ctx
                        .export_path
                        .clone()
                        .ok_or_else(|| FactoryError::missing(self.chain_name(), "an export path"))?;
                    tail.push(Arc::new(TypesetProcessor::new(typesetter, output)));
                }
                tail
            }
        };
        Ok(tail)
    }

    fn xhtml(&self) -> XhtmlProcessor {
        let ctx = self.context;
        let processor = XhtmlProcessor::new(ctx.locale.clone());
        match ctx.definitions.get(DOCUMENT_TITLE_KEY) {
            Some(title) => processor.with_title(title.clone()),
            None => processor,
        }
    }

    fn bootstrap(&self, script: &ScriptContext) {
        let ctx = self.context;
        let source = &ctx.settings.r.bootstrap;
        if source.trim().is_empty() {
            return;
        }

        let prepared = prepare_bootstrap(
            source,
            &ctx.definitions,
            &ctx.working_dir,
            &ctx.settings.script_operator(),
        );
        let result = prepared.and_then(|code| script.bootstrap(&code));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Bootstrap script failed");
            ctx.notifier.error(&e.to_string());
        }
    }
}

/// Build the chain for `context`.
pub fn create_processors(context: &ProcessorContext) -> Result<ProcessorChain, FactoryError> {
    ProcessorFactory::new(context).create()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SourceKind;
    use crate::processor::{
        CARET_MARKER, Output, PreviewSink, ProcessorKind, StageError, Typesetter, XsltTransformer,
    };
    use crate::script::{ScriptError, ScriptEvaluator};
    use crate::settings::Settings;
    use crate::status::{CollectingNotifier, StatusLevel};
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ProcessorKind::*;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<String>>);

    impl PreviewSink for RecordingSink {
        fn render(&self, html: &str) {
            self.0.lock().unwrap().push(html.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingTypesetter(Mutex<Vec<String>>);

    impl Typesetter for RecordingTypesetter {
        fn typeset(&self, document: &str, _output: &Path) -> Result<(), StageError> {
            self.0.lock().unwrap().push(document.to_string());
            Ok(())
        }
    }

    struct MarkdownXslt;

    impl XsltTransformer for MarkdownXslt {
        fn transform(&self, _document: &str, _stylesheet: &Path) -> Result<String, StageError> {
            Ok("# From XML".to_string())
        }
    }

    struct EchoEvaluator {
        bootstraps: Arc<Mutex<Vec<String>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptEvaluator for EchoEvaluator {
        fn name(&self) -> &str {
            "echo"
        }

        fn evaluate(&mut self, expression: &str) -> Result<String, ScriptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("<{expression}>"))
        }

        fn bootstrap(&mut self, script: &str) -> Result<(), ScriptError> {
            self.bootstraps.lock().unwrap().push(script.to_string());
            Ok(())
        }
    }

    fn script_context() -> (ScriptContext, Arc<Mutex<Vec<String>>>) {
        let bootstraps = Arc::new(Mutex::new(Vec::new()));
        let evaluator = EchoEvaluator {
            bootstraps: bootstraps.clone(),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        (ScriptContext::new(Box::new(evaluator)), bootstraps)
    }

    fn full_context(kind: SourceKind, format: ExportFormat) -> ProcessorContext {
        let (script, _) = script_context();
        ProcessorContext::new(kind, format)
            .with_preview(Arc::new(RecordingSink::default()))
            .with_typesetter(Arc::new(RecordingTypesetter::default()))
            .with_xslt(Arc::new(MarkdownXslt))
            .with_script(script)
            .with_export(format, Some(PathBuf::from("out.pdf")))
    }

    fn kinds(kind: SourceKind, format: ExportFormat) -> Vec<ProcessorKind> {
        create_processors(&full_context(kind, format))
            .unwrap()
            .kinds()
    }

    #[test]
    fn test_markdown_chains() {
        assert_eq!(
            kinds(SourceKind::Markdown, ExportFormat::None),
            vec![Definition, CaretInsertion, Markdown, CaretReplacement, Preview]
        );
        assert_eq!(
            kinds(SourceKind::Markdown, ExportFormat::Html),
            vec![Definition, Markdown]
        );
        assert_eq!(
            kinds(SourceKind::Markdown, ExportFormat::Xhtml),
            vec![Definition, Markdown, Xhtml]
        );
        assert_eq!(
            kinds(SourceKind::Markdown, ExportFormat::Markdown),
            vec![Definition, Identity]
        );
        assert_eq!(
            kinds(SourceKind::Markdown, ExportFormat::Pdf),
            vec![Definition, Markdown, Xhtml, Typeset]
        );
    }

    #[test]
    fn test_script_chains() {
        assert_eq!(
            kinds(SourceKind::RMarkdown, ExportFormat::Html),
            vec![Definition, ScriptVariable, Script, Markdown]
        );
        assert_eq!(
            kinds(SourceKind::RXml, ExportFormat::Xhtml),
            vec![Definition, ScriptVariable, Script, Xml, Markdown, Xhtml]
        );
    }

    #[test]
    fn test_xml_chain() {
        assert_eq!(
            kinds(SourceKind::Xml, ExportFormat::None),
            vec![Definition, Xml, CaretInsertion, Markdown, CaretReplacement, Preview]
        );
    }

    #[test]
    fn test_plain_chains() {
        assert_eq!(
            kinds(SourceKind::Plain, ExportFormat::None),
            vec![Definition, Preformatted, Preview]
        );
        assert_eq!(
            kinds(SourceKind::Yaml, ExportFormat::Pdf),
            vec![Definition, Preformatted, Xhtml, Typeset]
        );
    }

    #[test]
    fn test_describe() {
        let chain = create_processors(&full_context(SourceKind::Markdown, ExportFormat::Xhtml))
            .unwrap();
        assert_eq!(chain.describe(), "definition -> markdown -> xhtml");
    }

    #[test]
    fn test_missing_preview_sink() {
        let ctx = ProcessorContext::new(SourceKind::Markdown, ExportFormat::None);
        let err = create_processors(&ctx).unwrap_err();
        assert_eq!(err, FactoryError::missing("markdown to none", "a preview sink"));
    }

    #[test]
    fn test_missing_script_context() {
        let ctx = ProcessorContext::new(SourceKind::RMarkdown, ExportFormat::Html);
        let err = create_processors(&ctx).unwrap_err();
        assert_eq!(err, FactoryError::missing("rmarkdown to html", "a script context"));
    }

    #[test]
    fn test_missing_xslt() {
        let ctx = ProcessorContext::new(SourceKind::Xml, ExportFormat::Html);
        let err = create_processors(&ctx).unwrap_err();
        assert_eq!(err, FactoryError::missing("xml to html", "an XSLT transformer"));
    }

    #[test]
    fn test_missing_typesetter_and_export_path() {
        let ctx = ProcessorContext::new(SourceKind::Markdown, ExportFormat::Pdf);
        let err = create_processors(&ctx).unwrap_err();
        assert_eq!(err, FactoryError::missing("markdown to pdf", "a typesetter"));

        let ctx = ctx.with_typesetter(Arc::new(RecordingTypesetter::default()));
        let err = create_processors(&ctx).unwrap_err();
        assert_eq!(err, FactoryError::missing("markdown to pdf", "an export path"));
    }

    #[test]
    fn test_preview_chain_substitutes_and_marks_caret() {
        let sink = Arc::new(RecordingSink::default());
        let definitions: crate::definition::DefinitionMap =
            [("a.c".to_string(), "12".to_string())].into();
        let ctx = ProcessorContext::new(SourceKind::Markdown, ExportFormat::None)
            .with_definitions(Arc::new(definitions))
            .with_preview(sink.clone())
            .with_caret(crate::processor::Caret::new(4));

        let output = create_processors(&ctx).unwrap().apply("x = ${a.c} done");
        let html = output.into_text().unwrap();
        assert_eq!(html, "<p>x = <span id=\"caret\"></span>12 done</p>\n");
        assert!(!html.contains(CARET_MARKER));
        assert_eq!(*sink.0.lock().unwrap(), vec![html]);
    }

    #[test]
    fn test_pdf_chain_writes_titled_document() {
        let typesetter = Arc::new(RecordingTypesetter::default());
        let definitions: crate::definition::DefinitionMap =
            [(DOCUMENT_TITLE_KEY.to_string(), "Manual".to_string())].into();
        let ctx = ProcessorContext::new(SourceKind::Markdown, ExportFormat::Pdf)
            .with_definitions(Arc::new(definitions))
            .with_typesetter(typesetter.clone())
            .with_export(ExportFormat::Pdf, Some(PathBuf::from("manual.pdf")));

        let output = create_processors(&ctx).unwrap().apply("# Intro");
        assert_eq!(output, Output::Written(PathBuf::from("manual.pdf")));

        let documents = typesetter.0.lock().unwrap();
        assert!(documents[0].contains("<title>Manual</title>"));
        assert!(documents[0].contains("<h1>Intro</h1>"));
    }

    #[test]
    fn test_bootstrap_runs_with_working_directory() {
        let (script, bootstraps) = script_context();
        let mut settings = Settings::default();
        settings.r.bootstrap = "setwd(v$application$r$working$directory)".to_string();

        let ctx = ProcessorContext::new(SourceKind::RMarkdown, ExportFormat::Html)
            .with_settings(Arc::new(settings))
            .with_working_dir("/work")
            .with_script(script);
        create_processors(&ctx).unwrap();

        assert_eq!(*bootstraps.lock().unwrap(), vec!["setwd('/work')".to_string()]);
    }

    #[test]
    fn test_unbound_bootstrap_variable_is_reported() {
        let (script, bootstraps) = script_context();
        let notifier = Arc::new(CollectingNotifier::new());
        let mut settings = Settings::default();
        settings.r.bootstrap = "x <- v$undefined".to_string();

        let ctx = ProcessorContext::new(SourceKind::RMarkdown, ExportFormat::Html)
            .with_settings(Arc::new(settings))
            .with_notifier(notifier.clone())
            .with_script(script);

        assert!(create_processors(&ctx).is_ok());
        assert!(bootstraps.lock().unwrap().is_empty());
        assert_eq!(notifier.at_least(StatusLevel::Error).len(), 1);
    }
}
