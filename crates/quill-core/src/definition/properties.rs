/*
 * definition/properties.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Flat `key=value` definition sources.
 */

//! Flat properties.
//!
//! Each logical line is `key=value` or `key: value`. Blank lines and lines
//! starting with `#` or `!` are ignored, and a trailing backslash joins the
//! next line onto the current one. Values reference each other with the
//! fixed `${key}` property sigils.

use std::path::Path;

use super::DefinitionMap;
use super::error::DefinitionError;
use super::tree::DefinitionTree;

/// Parse properties text into a flat map; later keys replace earlier ones.
pub fn parse_properties(text: &str) -> DefinitionMap {
    let mut map = DefinitionMap::new();
    let mut pending = String::new();

    for line in text.lines() {
        let line = line.trim_start();

        if pending.is_empty() && (line.is_empty() || line.starts_with(['#', '!'])) {
            continue;
        }

        if let Some(continued) = line.strip_suffix('\\') {
            pending.push_str(continued);
            continue;
        }

        pending.push_str(line);
        if let Some((key, value)) = split_entry(&pending) {
            map.insert(key, value);
        }
        pending.clear();
    }

    if let Some((key, value)) = split_entry(&pending) {
        map.insert(key, value);
    }

    map
}

/// Read and parse a properties file.
pub fn load_properties(path: &Path) -> Result<DefinitionMap, DefinitionError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_properties(&content))
}

/// Build a tree from a flat map, one key node per path segment.
///
/// Keys are inserted in sorted order so the tree is deterministic.
pub fn properties_to_tree(map: &DefinitionMap) -> Result<DefinitionTree, DefinitionError> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut tree = DefinitionTree::new();
    for key in keys {
        tree.add_definition(key, map[key].as_str())?;
    }
    Ok(tree)
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.find(['=', ':']) {
        Some(at) => {
            let key = line[..at].trim_end();
            let value = line[at + 1..].trim_start();
            Some((key.to_string(), value.to_string()))
        }
        None => Some((line.to_string(), String::new())),
    }
}
