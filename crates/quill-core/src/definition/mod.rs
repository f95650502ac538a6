/*
 * definition/mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Variable definitions: tree, sources, and editing session.
 */

//! Variable definitions.
//!
//! Definitions are authored as a hierarchy ([`DefinitionTree`]) loaded from
//! YAML or flat properties and consumed as a flat [`DefinitionMap`] keyed by
//! dot-separated paths. A [`DefinitionSession`] owns the tree for an editing
//! session and caches the interpolated map until the next edit.

mod error;
mod properties;
mod session;
mod tree;
mod yaml;

use std::collections::HashMap;

pub use error::{DefinitionError, TreeError};
pub use properties::{load_properties, parse_properties, properties_to_tree};
pub use session::DefinitionSession;
pub use tree::{DefinitionTree, NodeId, Preorder, ROOT_NAME, SearchMode};
pub use yaml::{load_yaml, parse_yaml, to_yaml};

/// Dot-separated path to value.
pub type DefinitionMap = HashMap<String, String>;
