/*
 * sigils.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Delimiters that mark variable references in text.
 */

//! Sigils and sigil operators.
//!
//! A token is a bare key wrapped in a pair of delimiters, for example
//! `${a.b}`. Three variants exist:
//!
//! - [`SigilOperator::Definition`] - configurable delimiters used in documents
//! - [`SigilOperator::Script`] - keys rewritten for the script evaluator
//!   (`a.b` becomes `v$a$b`) and values quoted as string literals
//! - [`SigilOperator::Property`] - fixed `${` / `}` used by flat properties

use std::borrow::Cow;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEFINITION_BEGAN: &str = "${";
pub const DEFAULT_DEFINITION_ENDED: &str = "}";
pub const DEFAULT_SCRIPT_BEGAN: &str = "x( ";
pub const DEFAULT_SCRIPT_ENDED: &str = " )";

const PROPERTY_BEGAN: &str = "${";
const PROPERTY_ENDED: &str = "}";

/// Prefix of a script variable name.
pub const SCRIPT_VARIABLE_PREFIX: &str = "v$";

/// Separator between key segments in a definition path.
pub const KEY_SEPARATOR: char = '.';

const SCRIPT_KEY_SEPARATOR: char = '$';

/// An ordered pair of delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sigils {
    pub began: String,
    pub ended: String,
}

impl Sigils {
    pub fn new(began: impl Into<String>, ended: impl Into<String>) -> Self {
        Self {
            began: began.into(),
            ended: ended.into(),
        }
    }

    pub fn began(&self) -> &str {
        &self.began
    }

    pub fn ended(&self) -> &str {
        &self.ended
    }

    /// Wrap a name in these delimiters.
    pub fn entoken(&self, name: &str) -> String {
        let mut token = String::with_capacity(self.began.len() + name.len() + self.ended.len());
        token.push_str(&self.began);
        token.push_str(name);
        token.push_str(&self.ended);
        token
    }

    /// Strip these delimiters from a token, if it is one.
    pub fn detoken<'a>(&self, token: &'a str) -> Option<&'a str> {
        token
            .strip_prefix(self.began.as_str())
            .and_then(|rest| rest.strip_suffix(self.ended.as_str()))
    }

    /// Non-greedy pattern matching a token; group 1 captures the name.
    pub fn pattern(&self) -> Regex {
        let source = format!(
            "{}(.*?){}",
            regex::escape(&self.began),
            regex::escape(&self.ended)
        );
        Regex::new(&source).expect("escaped delimiters always form a valid pattern")
    }
}

/// How keys and values are rendered for a particular consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigilOperator {
    Definition(Sigils),
    Script(Sigils),
    Property(Sigils),
}

impl SigilOperator {
    pub fn definition(began: impl Into<String>, ended: impl Into<String>) -> Self {
        Self::Definition(Sigils::new(began, ended))
    }

    pub fn script(began: impl Into<String>, ended: impl Into<String>) -> Self {
        Self::Script(Sigils::new(began, ended))
    }

    pub fn property() -> Self {
        Self::Property(Sigils::new(PROPERTY_BEGAN, PROPERTY_ENDED))
    }

    pub fn sigils(&self) -> &Sigils {
        match self {
            Self::Definition(sigils) | Self::Script(sigils) | Self::Property(sigils) => sigils,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Definition(_) => "definition",
            Self::Script(_) => "script",
            Self::Property(_) => "property",
        }
    }

    /// The name a key is known by to this operator's consumer.
    ///
    /// Script keys are prefixed with `v$` and every `.` becomes `$`, so
    /// `a.b` is referenced as `v$a$b`.
    pub fn key_name<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self {
            Self::Script(_) => {
                let mut name = String::with_capacity(SCRIPT_VARIABLE_PREFIX.len() + key.len());
                name.push_str(SCRIPT_VARIABLE_PREFIX);
                name.extend(key.chars().map(|c| {
                    if c == KEY_SEPARATOR {
                        SCRIPT_KEY_SEPARATOR
                    } else {
                        c
                    }
                }));
                Cow::Owned(name)
            }
            Self::Definition(_) | Self::Property(_) => Cow::Borrowed(key),
        }
    }

    /// Wrap a bare key in this operator's delimiters.
    pub fn entoken(&self, key: &str) -> String {
        self.sigils().entoken(&self.key_name(key))
    }

    /// Render a value for this operator's consumer.
    ///
    /// Script values become single-quoted string literals with `\` and `'`
    /// escaped; other variants pass the value through.
    pub fn quote_value<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self {
            Self::Script(_) => {
                let mut quoted = String::with_capacity(value.len() + 2);
                quoted.push('\'');
                for c in value.chars() {
                    if c == '\\' || c == '\'' {
                        quoted.push('\\');
                    }
                    quoted.push(c);
                }
                quoted.push('\'');
                Cow::Owned(quoted)
            }
            Self::Definition(_) | Self::Property(_) => Cow::Borrowed(value),
        }
    }

    /// Text inserted into a document to reference `key`.
    ///
    /// Identical to [`entoken`](Self::entoken); for scripts this yields the
    /// `x( v$a$b )` form.
    pub fn inject(&self, key: &str) -> String {
        self.entoken(key)
    }

    pub fn pattern(&self) -> Regex {
        self.sigils().pattern()
    }
}

impl Default for SigilOperator {
    fn default() -> Self {
        Self::definition(DEFAULT_DEFINITION_BEGAN, DEFAULT_DEFINITION_ENDED)
    }
}
