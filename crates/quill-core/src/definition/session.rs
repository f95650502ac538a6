/*
 * definition/session.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Ownership of a definition tree while it is being edited.
 */

use std::path::Path;
use std::sync::Arc;

use super::DefinitionMap;
use super::error::DefinitionError;
use super::properties::{load_properties, properties_to_tree};
use super::tree::{DefinitionTree, NodeId};
use super::yaml::{load_yaml, parse_yaml, to_yaml};
use crate::interpolate::{InterpolationError, interpolate};
use crate::settings::Settings;
use crate::sigils::SigilOperator;
use crate::status::StatusNotifier;

/// A definition tree together with its interpolated flat map.
///
/// The resolved map is computed on demand and shared through an `Arc`;
/// any edit made through [`edit`](Self::edit) or a change of operator
/// discards it so the next [`resolve`](Self::resolve) rebuilds it.
pub struct DefinitionSession {
    tree: DefinitionTree,
    operator: SigilOperator,
    notifier: Arc<dyn StatusNotifier>,
    resolved: Option<Arc<DefinitionMap>>,
}

impl DefinitionSession {
    pub fn new(
        tree: DefinitionTree,
        operator: SigilOperator,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            tree,
            operator,
            notifier,
            resolved: None,
        }
    }

    pub fn from_yaml(
        document: &str,
        operator: SigilOperator,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Result<Self, DefinitionError> {
        Ok(Self::new(parse_yaml(document)?, operator, notifier))
    }

    pub fn load(
        path: &Path,
        operator: SigilOperator,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Result<Self, DefinitionError> {
        let tree = load_yaml(path)?;
        tracing::debug!(path = %path.display(), nodes = tree.len(), "Loaded definitions");
        Ok(Self::new(tree, operator, notifier))
    }

    /// Open a definitions file of either supported format.
    ///
    /// `.properties` files are flat and use the property sigils; anything
    /// else is read as YAML with the configured definition delimiters.
    pub fn open(
        path: &Path,
        settings: &Settings,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Result<Self, DefinitionError> {
        let is_properties = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("properties"));

        if is_properties {
            let tree = properties_to_tree(&load_properties(path)?)?;
            tracing::debug!(path = %path.display(), nodes = tree.len(), "Loaded properties");
            Ok(Self::new(tree, SigilOperator::property(), notifier))
        } else {
            Self::load(path, settings.definition_operator(), notifier)
        }
    }

    pub fn tree(&self) -> &DefinitionTree {
        &self.tree
    }

    pub fn operator(&self) -> &SigilOperator {
        &self.operator
    }

    /// Mutate the tree; the resolved map is rebuilt on next use.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut DefinitionTree) -> R) -> R {
        self.resolved = None;
        f(&mut self.tree)
    }

    pub fn set_operator(&mut self, operator: SigilOperator) {
        if operator != self.operator {
            self.operator = operator;
            self.resolved = None;
        }
    }

    /// The uninterpolated flat map.
    pub fn flat_map(&self) -> DefinitionMap {
        self.tree.to_flat_map()
    }

    /// True when a resolved map is cached.
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// The interpolated flat map, rebuilt if the tree changed.
    ///
    /// A malformed tree is reported but still resolved; a cycle is reported
    /// and returned as an error.
    pub fn resolve(&mut self) -> Result<Arc<DefinitionMap>, InterpolationError> {
        if let Some(resolved) = &self.resolved {
            return Ok(Arc::clone(resolved));
        }

        self.check_well_formed();

        let resolved = match interpolate(&self.tree.to_flat_map(), &self.operator) {
            Ok(map) => Arc::new(map),
            Err(e) => {
                self.notifier.error(&e.to_string());
                return Err(e);
            }
        };

        tracing::debug!(definitions = resolved.len(), "Resolved definitions");
        self.resolved = Some(Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Report the first malformed node, if any, through the status channel.
    pub fn check_well_formed(&self) -> Option<NodeId> {
        let problem = self.tree.is_well_formed()?;
        let path = self.tree.to_path(problem);
        self.notifier.warning(&format!(
            "Definition '{path}' must hold either a single value or nested keys"
        ));
        Some(problem)
    }

    pub fn to_yaml(&self) -> Result<String, DefinitionError> {
        to_yaml(&self.tree)
    }

    pub fn save(&self, path: &Path) -> Result<(), DefinitionError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}
