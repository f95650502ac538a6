/*
 * processor/markdown.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Markdown to HTML conversion.
 */

use comrak::{Options, markdown_to_html as render};

use super::{Output, Processor, ProcessorKind, StageError};

fn options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.superscript = true;
    options.extension.footnotes = true;
    options.extension.front_matter_delimiter = Some("---".to_string());
    // Raw HTML passes through.
    options.render.unsafe_ = true;
    options
}

/// Render Markdown to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    render(markdown, &options())
}

/// Converts Markdown to an HTML fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownProcessor;

impl MarkdownProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for MarkdownProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Markdown
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        Ok(Output::Text(markdown_to_html(text)))
    }
}
