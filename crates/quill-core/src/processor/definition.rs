/*
 * processor/definition.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Substitution of definition tokens in document text.
 */

use std::collections::HashMap;

use regex::{Captures, Regex};

use super::{Output, Processor, ProcessorKind, StageError};
use crate::definition::DefinitionMap;
use crate::sigils::SigilOperator;

/// Replaces every known token with its (already interpolated) value.
///
/// Tokens naming an undefined key are left in place so that the reader
/// sees which reference is missing.
pub struct DefinitionProcessor {
    pattern: Regex,
    values_by_token: HashMap<String, String>,
}

impl DefinitionProcessor {
    pub fn new(definitions: &DefinitionMap, operator: &SigilOperator) -> Self {
        let values_by_token = definitions
            .iter()
            .map(|(key, value)| (operator.entoken(key), value.clone()))
            .collect();

        Self {
            pattern: operator.pattern(),
            values_by_token,
        }
    }
}

impl Processor for DefinitionProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Definition
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        let mut unresolved = 0usize;
        let replaced = self.pattern.replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            match self.values_by_token.get(token) {
                Some(value) => value.clone(),
                None => {
                    unresolved += 1;
                    token.to_string()
                }
            }
        });

        if unresolved > 0 {
            tracing::debug!(unresolved, "Left undefined variable references in place");
        }
        Ok(Output::Text(replaced.into_owned()))
    }
}

/// Passes text through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProcessor;

impl Processor for IdentityProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Identity
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        Ok(Output::Text(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolate::interpolate;
    use pretty_assertions::assert_eq;

    fn definitions(entries: &[(&str, &str)]) -> DefinitionMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn text(output: Output) -> String {
        output.into_text().unwrap()
    }

    #[test]
    fn test_scenario_with_interpolated_map() {
        let op = SigilOperator::default();
        let resolved =
            interpolate(&definitions(&[("a.b", "1"), ("a.c", "${a.b}2")]), &op).unwrap();
        let processor = DefinitionProcessor::new(&resolved, &op);

        assert_eq!(text(processor.apply("x = ${a.c} done").unwrap()), "x = 12 done");
    }

    #[test]
    fn test_unknown_token_is_left_in_place() {
        let op = SigilOperator::default();
        let processor = DefinitionProcessor::new(&definitions(&[("a", "1")]), &op);
        assert_eq!(
            text(processor.apply("${a} and ${missing}").unwrap()),
            "1 and ${missing}"
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let op = SigilOperator::default();
        let processor = DefinitionProcessor::new(&definitions(&[("a", "${b}"), ("b", "2")]), &op);
        assert_eq!(text(processor.apply("${a}").unwrap()), "${b}");
    }

    #[test]
    fn test_custom_sigils() {
        let op = SigilOperator::definition("{{", "}}");
        let processor = DefinitionProcessor::new(&definitions(&[("name", "Ada")]), &op);
        assert_eq!(text(processor.apply("Hi {{name}}, ${name}").unwrap()), "Hi Ada, ${name}");
    }

    #[test]
    fn test_identity() {
        assert_eq!(text(IdentityProcessor.apply("same").unwrap()), "same");
    }
}
