/*
 * processor/preformatted.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Verbatim rendering of text that is not Markdown.
 */

use super::{Output, Processor, ProcessorKind, StageError};
use crate::html::escape_html;

/// Wraps escaped text in a `<pre>` block.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreformattedProcessor;

impl Processor for PreformattedProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Preformatted
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        Ok(Output::Text(format!("<pre>{}</pre>", escape_html(text))))
    }
}
