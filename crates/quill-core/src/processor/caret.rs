/*
 * processor/caret.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Tracking the editor caret through Markdown conversion.
 */

//! Caret tracking.
//!
//! Before Markdown conversion the preview chain inserts [`CARET_MARKER`] at
//! the caret offset; after conversion the marker is replaced by an empty
//! element with id [`CARET_ID`] that the preview can scroll to. The marker
//! uses private-use characters so it cannot collide with document text and
//! survives Markdown conversion as plain text.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Output, Processor, ProcessorKind, StageError};

pub const CARET_MARKER: &str = "\u{E000}caret\u{E001}";
pub const CARET_ID: &str = "caret";

const FENCES: [&str; 2] = ["```", "~~~"];

/// Shared caret offset, in bytes from the start of the document.
#[derive(Debug, Clone, Default)]
pub struct Caret(Arc<AtomicUsize>);

impl Caret {
    pub fn new(offset: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(offset)))
    }

    pub fn offset(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, offset: usize) {
        self.0.store(offset, Ordering::Relaxed);
    }
}

/// Inserts the caret marker into Markdown text.
pub struct CaretInsertionProcessor {
    caret: Caret,
}

impl CaretInsertionProcessor {
    pub fn new(caret: Caret) -> Self {
        Self { caret }
    }
}

impl Processor for CaretInsertionProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::CaretInsertion
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        let Some(at) = insertion_point(text, self.caret.offset()) else {
            return Ok(Output::Text(text.to_string()));
        };

        let mut marked = String::with_capacity(text.len() + CARET_MARKER.len());
        marked.push_str(&text[..at]);
        marked.push_str(CARET_MARKER);
        marked.push_str(&text[at..]);
        Ok(Output::Text(marked))
    }
}

/// Where the marker can go without changing the Markdown structure.
///
/// A caret inside a line's leading block syntax (`#`, `>`, list bullets,
/// indentation) moves to the end of that line. Fence lines get no marker.
fn insertion_point(text: &str, offset: usize) -> Option<usize> {
    let mut at = offset.min(text.len());
    while !text.is_char_boundary(at) {
        at -= 1;
    }

    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[at..].find('\n').map_or(text.len(), |i| at + i);
    let line = &text[line_start..line_end];

    if FENCES.iter().any(|fence| line.trim_start().starts_with(fence)) {
        return None;
    }

    let prefix = &text[line_start..at];
    let in_block_syntax = prefix.chars().all(|c| {
        c.is_whitespace()
            || c.is_ascii_digit()
            || matches!(c, '#' | '>' | '-' | '*' | '+' | '|' | '.' | ')')
    });

    if in_block_syntax {
        Some(line_end)
    } else {
        Some(at)
    }
}

/// Replaces the caret marker with an anchor element.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaretReplacementProcessor;

impl Processor for CaretReplacementProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::CaretReplacement
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        let anchor = format!("<span id=\"{CARET_ID}\"></span>");
        Ok(Output::Text(text.replacen(CARET_MARKER, &anchor, 1).replace(CARET_MARKER, "")))
    }
}
