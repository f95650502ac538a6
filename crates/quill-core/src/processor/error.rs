/*
 * processor/error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Errors raised by processors and by chain construction.
 */

use thiserror::Error;

/// A single stage failed to transform its input.
///
/// The chain driver reports the error and passes the stage's input on
/// unchanged.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("{stage}: {message}")]
    Failed { stage: String, message: String },

    #[error("{stage}: {source}")]
    Io {
        stage: String,
        #[source]
        source: std::io::Error,
    },
}

impl StageError {
    pub fn failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn io(stage: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            stage: stage.into(),
            source,
        }
    }

    /// Name of the stage that failed.
    pub fn stage(&self) -> &str {
        match self {
            StageError::Failed { stage, .. } | StageError::Io { stage, .. } => stage,
        }
    }
}

/// A chain cannot be built from the given context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("Cannot build a {chain} chain without {field}")]
    MissingContext {
        chain: String,
        field: &'static str,
    },
}

impl FactoryError {
    pub fn missing(chain: impl Into<String>, field: &'static str) -> Self {
        Self::MissingContext {
            chain: chain.into(),
            field,
        }
    }
}
