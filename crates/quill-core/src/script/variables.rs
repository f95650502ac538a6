/*
 * script/variables.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Rewriting of script variable names into R string literals.
 */

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::definition::DefinitionMap;
use crate::processor::{Output, Processor, ProcessorKind, StageError};
use crate::sigils::SigilOperator;

/// Where a script variable name may start: `v$` followed by identifier
/// characters and `$`.
static SCRIPT_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bv\$[\w$]+").expect("Invalid regex pattern for script variable names")
});

/// Replaces script variable names with quoted definition values.
///
/// For the definition `a.b: it's`, the name `v$a$b` in R code becomes
/// `'it\'s'`. Only whole names are replaced: with just `a` defined,
/// neither `v$ab` nor `v$a$b` is touched.
///
/// Keys may contain characters R reads as operators, such as `-` in
/// `a.first-name`. At each name start the longest defined name wins, so
/// `v$a$first-name` is replaced whole when that key is defined.
pub struct ScriptVariableProcessor {
    literals: HashMap<String, String>,
    /// Defined names, longest first.
    names: Vec<String>,
}

/// A script variable name found in R code.
struct Reference<'t> {
    start: usize,
    name: &'t str,
    bound: bool,
}

impl ScriptVariableProcessor {
    /// `operator` is normally [`SigilOperator::Script`].
    pub fn new(definitions: &DefinitionMap, operator: &SigilOperator) -> Self {
        let literals: HashMap<String, String> = definitions
            .iter()
            .map(|(key, value)| {
                (
                    operator.key_name(key).into_owned(),
                    operator.quote_value(value).into_owned(),
                )
            })
            .collect();

        let mut names: Vec<String> = literals.keys().cloned().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Self { literals, names }
    }

    fn references<'t>(&self, text: &'t str) -> Vec<Reference<'t>> {
        let mut references = Vec::new();
        let mut pos = 0;
        while let Some(m) = SCRIPT_NAME_PATTERN.find_at(text, pos) {
            let rest = &text[m.start()..];
            let defined = self.names.iter().find(|name| {
                rest.starts_with(name.as_str()) && !continues_name(&rest[name.len()..])
            });

            let reference = match defined {
                Some(name) => Reference {
                    start: m.start(),
                    name: &rest[..name.len()],
                    bound: true,
                },
                None => Reference {
                    start: m.start(),
                    name: m.as_str(),
                    bound: false,
                },
            };
            pos = reference.start + reference.name.len();
            references.push(reference);
        }
        references
    }

    /// Script variable names in `text` with no definition, in order of
    /// first appearance.
    pub fn unbound_names(&self, text: &str) -> Vec<String> {
        let mut unbound: Vec<String> = Vec::new();
        for reference in self.references(text) {
            if !reference.bound && !unbound.iter().any(|n| n == reference.name) {
                unbound.push(reference.name.to_string());
            }
        }
        unbound
    }

    pub fn substitute(&self, text: &str) -> String {
        if self.literals.is_empty() {
            return text.to_string();
        }

        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for reference in self.references(text) {
            if reference.bound {
                result.push_str(&text[last..reference.start]);
                result.push_str(&self.literals[reference.name]);
                last = reference.start + reference.name.len();
            }
        }
        result.push_str(&text[last..]);
        result
    }
}

/// True when `rest` carries on the name before it.
fn continues_name(rest: &str) -> bool {
    rest.chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl Processor for ScriptVariableProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::ScriptVariable
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        Ok(Output::Text(self.substitute(text)))
    }
}
