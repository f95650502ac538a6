/*
 * processor/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Text processors and the chains that connect them.
 */

//! Text processing chains.
//!
//! A document is turned into its output by an ordered list of
//! [`Processor`]s held in a [`ProcessorChain`]. Each processor receives the
//! previous processor's text. The last processor is the terminal: it hands
//! the result to the preview, returns it, or writes it to disk and reports
//! [`Output::Written`].
//!
//! ```text
//! Definition -> [ScriptVariable -> Script] -> [Xml] -> Markdown -> ... -> terminal
//! ```
//!
//! Chains are assembled by [`ProcessorFactory`] from a [`ProcessorContext`].

mod caret;
mod chain;
mod context;
mod definition;
mod error;
mod factory;
mod markdown;
mod preformatted;
mod preview;
mod typeset;
mod xhtml;
mod xml;

use std::path::PathBuf;

pub use caret::{CARET_ID, CARET_MARKER, Caret, CaretInsertionProcessor, CaretReplacementProcessor};
pub use chain::ProcessorChain;
pub use context::ProcessorContext;
pub use definition::{DefinitionProcessor, IdentityProcessor};
pub use error::{FactoryError, StageError};
pub use factory::{ProcessorFactory, create_processors};
pub use markdown::{MarkdownProcessor, markdown_to_html};
pub use preformatted::PreformattedProcessor;
pub use preview::{PreviewProcessor, PreviewSink};
pub use typeset::{CommandTypesetter, TypesetProcessor, Typesetter};
pub use xhtml::{DOCUMENT_TITLE_KEY, XhtmlProcessor};
pub use xml::{XmlProcessor, XsltTransformer, XsltprocTransformer, find_stylesheet};

/// Identifies what a processor does, independent of its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    /// Substitutes definition tokens with values
    Definition,
    /// Substitutes script variable names with quoted values
    ScriptVariable,
    /// Evaluates inline R expressions
    Script,
    /// Applies the document's XSLT stylesheet
    Xml,
    /// Marks the caret position before Markdown conversion
    CaretInsertion,
    /// Converts Markdown to an HTML fragment
    Markdown,
    /// Turns the caret mark into an anchor element
    CaretReplacement,
    /// Escapes non-Markdown text into a `<pre>` block
    Preformatted,
    /// Wraps an HTML fragment into a complete XHTML document
    Xhtml,
    /// Returns its input unchanged
    Identity,
    /// Hands HTML to the preview
    Preview,
    /// Writes a typeset document
    Typeset,
}

impl ProcessorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorKind::Definition => "definition",
            ProcessorKind::ScriptVariable => "script-variable",
            ProcessorKind::Script => "script",
            ProcessorKind::Xml => "xml",
            ProcessorKind::CaretInsertion => "caret-insertion",
            ProcessorKind::Markdown => "markdown",
            ProcessorKind::CaretReplacement => "caret-replacement",
            ProcessorKind::Preformatted => "preformatted",
            ProcessorKind::Xhtml => "xhtml",
            ProcessorKind::Identity => "identity",
            ProcessorKind::Preview => "preview",
            ProcessorKind::Typeset => "typeset",
        }
    }
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of applying a processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Transformed text for the next processor (or the caller).
    Text(String),
    /// The result was written to this file; there is no text to pass on.
    Written(PathBuf),
}

impl Output {
    pub fn text(&self) -> Option<&str> {
        match self {
            Output::Text(text) => Some(text),
            Output::Written(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Output::Text(text) => Some(text),
            Output::Written(_) => None,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Output::Written(_))
    }
}

/// One step of a processor chain.
///
/// # Thread Safety
///
/// Processors must be `Send + Sync` so a chain can be built on one thread
/// and run on the export worker.
pub trait Processor: Send + Sync {
    fn kind(&self) -> ProcessorKind;

    /// Human-readable name, used for logging.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Transform `text`.
    ///
    /// # Errors
    ///
    /// A failure is local to this stage; the chain decides whether to fall
    /// back to `text` or stop.
    fn apply(&self, text: &str) -> Result<Output, StageError>;
}
