/*
 * interpolate.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Resolution of variable references between definitions.
 */

//! Interpolation of definition values.
//!
//! Values may reference other definitions using the operator's tokens, for
//! example `c: "${a.b}2"`. Interpolation replaces every token whose key is
//! defined with that key's fully resolved value and every token whose key is
//! not defined with the bare key name, so that the result contains no token
//! for a key present in the map.
//!
//! ```text
//! {"a.b": "1", "a.c": "${a.b}2"}  ->  {"a.b": "1", "a.c": "12"}
//! ```
//!
//! A key that (directly or transitively) references itself is reported as
//! [`InterpolationError::CyclicReference`].

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::definition::DefinitionMap;
use crate::sigils::SigilOperator;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("Cyclic reference: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },
}

/// Resolve every value in `map` against the rest of the map.
pub fn interpolate(
    map: &DefinitionMap,
    operator: &SigilOperator,
) -> Result<DefinitionMap, InterpolationError> {
    Interpolator::new(operator, map).resolve_all()
}

/// Resolves tokens against a flat definition map.
///
/// Tokens are matched by their full text (`${a.b}`, or `x( v$a$b )` for
/// script sigils), so every operator variant can be interpolated.
pub struct Interpolator<'a> {
    map: &'a DefinitionMap,
    pattern: Regex,
    keys_by_token: HashMap<String, &'a str>,
}

impl<'a> Interpolator<'a> {
    pub fn new(operator: &SigilOperator, map: &'a DefinitionMap) -> Self {
        let keys_by_token = map
            .keys()
            .map(|key| (operator.entoken(key), key.as_str()))
            .collect();

        Self {
            map,
            pattern: operator.pattern(),
            keys_by_token,
        }
    }

    /// Resolve the whole map.
    pub fn resolve_all(&self) -> Result<DefinitionMap, InterpolationError> {
        let mut resolved = DefinitionMap::with_capacity(self.map.len());
        let mut visiting = Vec::new();

        for key in self.map.keys() {
            self.resolve_key(key, &mut resolved, &mut visiting)?;
        }

        Ok(resolved)
    }

    /// Resolve the tokens in arbitrary text against the map.
    pub fn resolve_text(&self, text: &str) -> Result<String, InterpolationError> {
        let mut resolved = DefinitionMap::new();
        let mut visiting = Vec::new();
        self.substitute(text, &mut resolved, &mut visiting)
    }

    fn resolve_key(
        &self,
        key: &str,
        resolved: &mut DefinitionMap,
        visiting: &mut Vec<String>,
    ) -> Result<String, InterpolationError> {
        if let Some(value) = resolved.get(key) {
            return Ok(value.clone());
        }

        if let Some(start) = visiting.iter().position(|k| k == key) {
            let mut chain = visiting[start..].to_vec();
            chain.push(key.to_string());
            return Err(InterpolationError::CyclicReference { chain });
        }

        let Some(raw) = self.map.get(key) else {
            return Ok(key.to_string());
        };

        visiting.push(key.to_string());
        let value = self.substitute(raw, resolved, visiting)?;
        visiting.pop();

        resolved.insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn substitute(
        &self,
        text: &str,
        resolved: &mut DefinitionMap,
        visiting: &mut Vec<String>,
    ) -> Result<String, InterpolationError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(text) {
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&text[last..token.start()]);

            match self.keys_by_token.get(token.as_str()) {
                Some(key) => out.push_str(&self.resolve_key(key, resolved, visiting)?),
                None => out.push_str(name.as_str()),
            }

            last = token.end();
        }

        out.push_str(&text[last..]);
        Ok(out)
    }
}
