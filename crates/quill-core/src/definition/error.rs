/*
 * definition/error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Errors raised while loading or editing definitions.
 */

use thiserror::Error;

use super::tree::NodeId;

/// Structural edit rejected by a [`DefinitionTree`](super::DefinitionTree).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node {0:?} does not belong to this tree")]
    InvalidNode(NodeId),

    #[error("The root node cannot be {0}")]
    RootMutation(&'static str),

    #[error("Cannot move node {node:?} beneath its own descendant {target:?}")]
    CyclicMove { node: NodeId, target: NodeId },

    #[error("Node {0:?} is detached from the tree")]
    Detached(NodeId),
}

/// Failure to read or write a definitions document.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Definitions must be a mapping at the top level, found {0}")]
    NotAMapping(&'static str),

    #[error("Unsupported value at '{path}': {reason}")]
    Unsupported { path: String, reason: String },

    #[error("Invalid definition tree: {0}")]
    Tree(#[from] TreeError),
}

impl DefinitionError {
    pub fn unsupported(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
