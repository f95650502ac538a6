/*
 * processor/context.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Everything a processor chain is built from.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::caret::Caret;
use super::preview::PreviewSink;
use super::typeset::Typesetter;
use super::xml::XsltTransformer;
use crate::definition::DefinitionMap;
use crate::format::{ExportFormat, SourceKind};
use crate::script::ScriptContext;
use crate::settings::Settings;
use crate::status::{StatusNotifier, TracingNotifier};

/// Inputs to [`ProcessorFactory`](super::ProcessorFactory).
///
/// Plain fields describe the document and the requested output. The
/// optional collaborators are required only by the chains that use them:
/// a preview sink for previews, a script context for R kinds, an XSLT
/// transformer for XML kinds, and a typesetter plus export path for typeset
/// exports.
#[derive(Clone)]
pub struct ProcessorContext {
    /// The document being processed, if it exists on disk.
    pub source_path: Option<PathBuf>,
    pub source_kind: SourceKind,
    pub export_format: ExportFormat,
    /// Where a typeset export is written.
    pub export_path: Option<PathBuf>,
    pub locale: String,
    /// Directory R runs in.
    pub working_dir: PathBuf,
    /// Interpolated definitions.
    pub definitions: Arc<DefinitionMap>,
    pub settings: Arc<Settings>,
    pub caret: Caret,
    pub notifier: Arc<dyn StatusNotifier>,
    pub script: Option<ScriptContext>,
    pub preview: Option<Arc<dyn PreviewSink>>,
    pub typesetter: Option<Arc<dyn Typesetter>>,
    pub xslt: Option<Arc<dyn XsltTransformer>>,
}

impl std::fmt::Debug for ProcessorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorContext")
            .field("source_path", &self.source_path)
            .field("source_kind", &self.source_kind)
            .field("export_format", &self.export_format)
            .field("export_path", &self.export_path)
            .field("locale", &self.locale)
            .field("working_dir", &self.working_dir)
            .field("definitions", &self.definitions.len())
            .field("caret", &self.caret.offset())
            .field("script", &self.script)
            .field("preview", &self.preview.is_some())
            .field("typesetter", &self.typesetter.is_some())
            .field("xslt", &self.xslt.is_some())
            .finish()
    }
}

impl ProcessorContext {
    /// Context with default settings and no collaborators.
    pub fn new(source_kind: SourceKind, export_format: ExportFormat) -> Self {
        let settings = Settings::default();
        Self {
            source_path: None,
            source_kind,
            export_format,
            export_path: None,
            locale: settings.locale.clone(),
            working_dir: PathBuf::from("."),
            definitions: Arc::new(DefinitionMap::new()),
            settings: Arc::new(settings),
            caret: Caret::default(),
            notifier: Arc::new(TracingNotifier),
            script: None,
            preview: None,
            typesetter: None,
            xslt: None,
        }
    }

    /// Context for the document at `path`.
    ///
    /// The source kind comes from the settings' file type table; the locale
    /// and R working directory come from the settings.
    pub fn for_path(path: impl Into<PathBuf>, settings: Arc<Settings>) -> Self {
        let path = path.into();
        let source_kind = settings.file_types.kind_of(&path);
        let base_dir = parent_dir(&path);
        let working_dir = settings.script_working_dir(&base_dir);

        Self {
            source_path: Some(path),
            source_kind,
            locale: settings.locale.clone(),
            working_dir,
            settings,
            ..Self::new(source_kind, ExportFormat::None)
        }
    }

    pub fn with_export(mut self, format: ExportFormat, path: Option<PathBuf>) -> Self {
        self.export_format = format;
        self.export_path = path;
        self
    }

    pub fn with_definitions(mut self, definitions: Arc<DefinitionMap>) -> Self {
        self.definitions = definitions;
        self
    }

    pub fn with_settings(mut self, settings: Arc<Settings>) -> Self {
        self.locale = settings.locale.clone();
        self.settings = settings;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_caret(mut self, caret: Caret) -> Self {
        self.caret = caret;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn StatusNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_script(mut self, script: ScriptContext) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_preview(mut self, sink: Arc<dyn PreviewSink>) -> Self {
        self.preview = Some(sink);
        self
    }

    pub fn with_typesetter(mut self, typesetter: Arc<dyn Typesetter>) -> Self {
        self.typesetter = Some(typesetter);
        self
    }

    pub fn with_xslt(mut self, transformer: Arc<dyn XsltTransformer>) -> Self {
        self.xslt = Some(transformer);
        self
    }

    /// Directory relative references in the document resolve against.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_deref()
            .map(parent_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
