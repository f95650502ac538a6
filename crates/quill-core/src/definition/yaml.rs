/*
 * definition/yaml.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Reading and writing definition trees as YAML.
 */

//! YAML definitions documents.
//!
//! A mapping entry whose value is a scalar becomes a key node holding one
//! value leaf; a nested mapping becomes a key node with nested key nodes.
//! Sequences of scalars are joined with `", "` and `null` becomes an empty
//! value. Writing reverses the mapping: a key node with a single leaf is
//! written as a scalar entry, anything else as a nested mapping.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::error::DefinitionError;
use super::tree::{DefinitionTree, NodeId};
use crate::sigils::KEY_SEPARATOR;

const SEQUENCE_SEPARATOR: &str = ", ";

/// Parse a YAML document into a new tree.
///
/// An empty document yields an empty tree.
pub fn parse_yaml(document: &str) -> Result<DefinitionTree, DefinitionError> {
    let value: Value = serde_yaml::from_str(document)?;
    let mut tree = DefinitionTree::new();

    match value {
        Value::Null => {}
        Value::Mapping(mapping) => {
            let root = tree.root();
            adopt_mapping(&mut tree, root, &mapping, "")?;
        }
        other => return Err(DefinitionError::NotAMapping(kind_name(&other))),
    }

    Ok(tree)
}

/// Read and parse a YAML definitions file.
pub fn load_yaml(path: &Path) -> Result<DefinitionTree, DefinitionError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content)
}

/// Serialize a tree back to YAML.
pub fn to_yaml(tree: &DefinitionTree) -> Result<String, DefinitionError> {
    let mapping = export_children(tree, tree.root());
    Ok(serde_yaml::to_string(&Value::Mapping(mapping))?)
}

fn adopt_mapping(
    tree: &mut DefinitionTree,
    parent: NodeId,
    mapping: &Mapping,
    path: &str,
) -> Result<(), DefinitionError> {
    for (key, value) in mapping {
        let key = scalar_text(key, path)?;
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}{KEY_SEPARATOR}{key}")
        };

        let node = tree.add_child(parent, key).map_err(|e| {
            DefinitionError::unsupported(child_path.clone(), e.to_string())
        })?;

        match untag(value) {
            Value::Mapping(nested) => adopt_mapping(tree, node, nested, &child_path)?,
            scalar => {
                let text = scalar_text(scalar, &child_path)?;
                tree.add_child(node, text).map_err(|e| {
                    DefinitionError::unsupported(child_path.clone(), e.to_string())
                })?;
            }
        }
    }
    Ok(())
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn scalar_text(value: &Value, path: &str) -> Result<String, DefinitionError> {
    match untag(value) {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Sequence(items) => {
            let parts = items
                .iter()
                .map(|item| match untag(item) {
                    Value::Sequence(_) | Value::Mapping(_) => Err(DefinitionError::unsupported(
                        path,
                        "sequences may only hold scalars",
                    )),
                    scalar => scalar_text(scalar, path),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(SEQUENCE_SEPARATOR))
        }
        Value::Mapping(_) | Value::Tagged(_) => Err(DefinitionError::unsupported(
            path,
            "expected a scalar value",
        )),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn export_children(tree: &DefinitionTree, node: NodeId) -> Mapping {
    let mut mapping = Mapping::new();
    for &child in tree.children(node) {
        let key = Value::String(tree.value(child).to_string());
        let value = match tree.children(child) {
            [] => Value::String(String::new()),
            [leaf] if tree.is_leaf(*leaf) => Value::String(tree.value(*leaf).to_string()),
            _ => Value::Mapping(export_children(tree, child)),
        };
        mapping.insert(key, value);
    }
    mapping
}
