//! Error types for quill-core

use thiserror::Error;

use crate::definition::{DefinitionError, TreeError};
use crate::export::ExportError;
use crate::interpolate::InterpolationError;
use crate::processor::{FactoryError, StageError};
use crate::script::ScriptError;
use crate::settings::SettingsError;

#[derive(Error, Debug)]
pub enum QuillError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("{0}")]
    Other(String),
}

impl QuillError {
    /// Create an error from any message.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, QuillError>;
