/*
 * script/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Inline R evaluation.
 */

//! Inline R evaluation.
//!
//! R Markdown and R XML documents may embed R expressions inline, for
//! example `` `r 1+1` ``. Before evaluation, references to definitions are
//! rewritten into R string literals by [`ScriptVariableProcessor`]; the
//! [`ScriptProcessor`] then evaluates each expression through a shared
//! [`ScriptContext`] that owns the evaluator and a bounded result cache.
//!
//! # Finding Rscript
//!
//! [`find_rscript`] searches in this order:
//! 1. `QUILL_R` environment variable (path to an R installation or to
//!    the Rscript binary)
//! 2. System PATH via `which`

mod bootstrap;
mod cache;
mod context;
mod processor;
mod rscript;
mod variables;

use thiserror::Error;

pub use bootstrap::{WORKING_DIRECTORY_KEY, prepare_bootstrap};
pub use cache::BoundedCache;
pub use context::{ScriptContext, ScriptEvaluator, UnavailableEvaluator, to_inline_html};
pub use processor::ScriptProcessor;
pub use rscript::{RscriptEvaluator, find_rscript};
pub use variables::ScriptVariableProcessor;

/// Longest expression excerpt quoted in an error message.
const EXPRESSION_EXCERPT_CHARS: usize = 50;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("R is not available: {0}")]
    RuntimeNotFound(String),

    #[error("Evaluation of `{expression}` failed: {message}")]
    EvaluationFailed { expression: String, message: String },

    #[error("Bootstrap script references undefined variable {0}")]
    UnboundVariable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// Evaluation failure quoting (at most) the start of `expression`.
    pub fn evaluation_failed(expression: &str, message: impl Into<String>) -> Self {
        let mut excerpt: String = expression.chars().take(EXPRESSION_EXCERPT_CHARS).collect();
        if excerpt.len() < expression.len() {
            excerpt.push_str("...");
        }
        Self::EvaluationFailed {
            expression: excerpt,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_expressions_are_truncated() {
        let expression = "x".repeat(80);
        let err = ScriptError::evaluation_failed(&expression, "boom");
        let ScriptError::EvaluationFailed { expression, .. } = err else {
            panic!("wrong variant");
        };
        assert_eq!(expression.len(), EXPRESSION_EXCERPT_CHARS + 3);
        assert!(expression.ends_with("..."));
    }

    #[test]
    fn test_short_expressions_are_kept() {
        let err = ScriptError::evaluation_failed("1+", "unexpected end of input");
        assert_eq!(
            err.to_string(),
            "Evaluation of `1+` failed: unexpected end of input"
        );
    }
}
