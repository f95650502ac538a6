/*
 * settings.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Workspace settings.
 */

//! Workspace settings.
//!
//! Settings are read from a YAML file; every field is optional and falls
//! back to its default:
//!
//! ```yaml
//! definitions:
//!   delimiter: { began: "${", ended: "}" }
//! r:
//!   delimiter: { began: "x( ", ended: " )" }
//!   inline: { began: "`r ", ended: "`" }
//!   bootstrap: "source('setup.R')"
//!   working_directory: scripts
//!   cache_capacity: 512
//! locale: en
//! file_types:
//!   rmarkdown: ["*.Rmd"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::FileTypeTable;
use crate::sigils::{
    DEFAULT_DEFINITION_BEGAN, DEFAULT_DEFINITION_ENDED, DEFAULT_SCRIPT_BEGAN,
    DEFAULT_SCRIPT_ENDED, SigilOperator, Sigils,
};

/// Default delimiters of an inline R expression.
pub const DEFAULT_INLINE_BEGAN: &str = "`r ";
pub const DEFAULT_INLINE_ENDED: &str = "`";

/// Default number of evaluated expressions kept per document.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl SettingsError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub definitions: DefinitionSettings,
    pub r: ScriptSettings,
    pub locale: String,
    pub file_types: FileTypeTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            definitions: DefinitionSettings::default(),
            r: ScriptSettings::default(),
            locale: DEFAULT_LOCALE.to_string(),
            file_types: FileTypeTable::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionSettings {
    pub delimiter: Sigils,
}

impl Default for DefinitionSettings {
    fn default() -> Self {
        Self {
            delimiter: Sigils::new(DEFAULT_DEFINITION_BEGAN, DEFAULT_DEFINITION_ENDED),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Delimiters used when inserting a variable reference into R code.
    pub delimiter: Sigils,
    /// Delimiters of an inline R expression in a document.
    pub inline: Sigils,
    /// R code evaluated once before the first expression.
    pub bootstrap: String,
    /// Directory R runs in; relative paths are resolved against the document.
    pub working_directory: Option<PathBuf>,
    pub cache_capacity: usize,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            delimiter: Sigils::new(DEFAULT_SCRIPT_BEGAN, DEFAULT_SCRIPT_ENDED),
            inline: Sigils::new(DEFAULT_INLINE_BEGAN, DEFAULT_INLINE_ENDED),
            bootstrap: String::new(),
            working_directory: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Settings {
    /// Parse and validate settings from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = if text.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(text)?
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Self::from_yaml(&text)
    }

    /// Read settings from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        check_sigils("definitions.delimiter", &self.definitions.delimiter)?;
        check_sigils("r.delimiter", &self.r.delimiter)?;
        check_sigils("r.inline", &self.r.inline)?;
        if self.definitions.delimiter == self.r.inline {
            return Err(SettingsError::invalid(
                "r.inline",
                "must differ from definitions.delimiter",
            ));
        }

        if self.r.cache_capacity == 0 {
            return Err(SettingsError::invalid(
                "r.cache_capacity",
                "must be at least 1",
            ));
        }
        if self.locale.trim().is_empty() {
            return Err(SettingsError::invalid("locale", "must not be empty"));
        }
        Ok(())
    }

    /// Operator for variable references in documents.
    pub fn definition_operator(&self) -> SigilOperator {
        SigilOperator::Definition(self.definitions.delimiter.clone())
    }

    /// Operator for variable references in R code.
    pub fn script_operator(&self) -> SigilOperator {
        SigilOperator::Script(self.r.delimiter.clone())
    }

    /// R working directory, resolved against `base`.
    pub fn script_working_dir(&self, base: &Path) -> PathBuf {
        match &self.r.working_directory {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        }
    }
}

fn check_sigils(key: &'static str, sigils: &Sigils) -> Result<(), SettingsError> {
    if sigils.began.is_empty() || sigils.ended.is_empty() {
        return Err(SettingsError::invalid(key, "delimiters must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SourceKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.definition_operator().entoken("a"), "${a}");
        assert_eq!(settings.script_operator().entoken("a.b"), "x( v$a$b )");
        assert_eq!(settings.r.inline, Sigils::new("`r ", "`"));
        assert_eq!(settings.r.cache_capacity, 512);
        assert_eq!(settings.locale, "en");
    }

    #[test]
    fn test_empty_text_is_default() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::from_yaml(
            "definitions:\n  delimiter:\n    began: '{{'\n    ended: '}}'\nlocale: fr\n",
        )
        .unwrap();
        assert_eq!(settings.definition_operator().entoken("x"), "{{x}}");
        assert_eq!(settings.locale, "fr");
        assert_eq!(settings.r, ScriptSettings::default());
    }

    #[test]
    fn test_file_types_override() {
        let settings = Settings::from_yaml("file_types:\n  rmarkdown: ['*.qmd']\n").unwrap();
        assert_eq!(
            settings.file_types.kind_of(Path::new("a.qmd")),
            SourceKind::RMarkdown
        );
    }

    #[test]
    fn test_empty_delimiter_is_rejected() {
        let err =
            Settings::from_yaml("r:\n  inline:\n    began: ''\n    ended: '`'\n").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { key: "r.inline", .. }));
    }

    #[test]
    fn test_inline_delimiters_must_differ_from_definitions() {
        let yaml = "definitions:\n  delimiter:\n    began: '`r '\n    ended: '`'\n";
        let err = Settings::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { key: "r.inline", .. }));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = Settings::from_yaml("r:\n  cache_capacity: 0\n").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                key: "r.cache_capacity",
                ..
            }
        ));
    }

    #[test]
    fn test_working_dir_resolution() {
        let mut settings = Settings::default();
        let base = Path::new("/docs");
        assert_eq!(settings.script_working_dir(base), PathBuf::from("/docs"));

        settings.r.working_directory = Some(PathBuf::from("scripts"));
        assert_eq!(settings.script_working_dir(base), PathBuf::from("/docs/scripts"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("quill.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.yaml");
        let err = Settings::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }
}
