/*
 * script/processor.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Evaluation of inline R expressions in document text.
 */

use std::sync::Arc;

use super::context::ScriptContext;
use crate::processor::{Output, Processor, ProcessorKind, StageError};
use crate::sigils::Sigils;
use crate::status::StatusNotifier;

/// Replaces each inline expression with its evaluated result.
///
/// With the default delimiters, `` `r 1+1` `` becomes `2`. A span without
/// a closing delimiter is left as is, along with the rest of the text. When
/// evaluation fails the original span is kept and a warning is reported.
pub struct ScriptProcessor {
    delimiters: Sigils,
    context: ScriptContext,
    notifier: Arc<dyn StatusNotifier>,
}

impl ScriptProcessor {
    /// Create a processor; the context's cache is cleared.
    pub fn new(
        delimiters: Sigils,
        context: ScriptContext,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        context.clear();
        Self {
            delimiters,
            context,
            notifier,
        }
    }
}

impl Processor for ScriptProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Script
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        let began = self.delimiters.began();
        let ended = self.delimiters.ended();

        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(began) {
            out.push_str(&rest[..start]);
            let body = &rest[start + began.len()..];

            let Some(end) = body.find(ended) else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };

            let expression = &body[..end];
            let span_len = began.len() + end + ended.len();
            match self.context.evaluate(expression) {
                Ok(value) => out.push_str(&value),
                Err(e) => {
                    tracing::warn!(error = %e, "Inline expression failed");
                    self.notifier.warning(&e.to_string());
                    out.push_str(&rest[start..start + span_len]);
                }
            }
            rest = &rest[start + span_len..];
        }

        out.push_str(rest);
        Ok(Output::Text(out))
    }
}
