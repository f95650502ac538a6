/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Source kinds and export formats.
 */

//! What a document is, and what it is turned into.
//!
//! The [`SourceKind`] of a document is inferred from its file name using a
//! configurable glob table ([`FileTypeTable`]). The [`ExportFormat`] selects
//! the tail of the processor chain.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

/// Kind of source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Markdown
    Markdown,
    /// Markdown with inline R expressions
    #[serde(rename = "rmarkdown")]
    RMarkdown,
    /// XML transformed by its `xml-stylesheet`
    Xml,
    /// XML with inline R expressions
    #[serde(rename = "rxml")]
    RXml,
    /// Flat `key=value` definitions
    Properties,
    /// YAML definitions
    Yaml,
    /// Anything else, previewed verbatim
    Plain,
}

impl SourceKind {
    /// Kinds in the order their globs are consulted.
    pub const ALL: [SourceKind; 7] = [
        SourceKind::RMarkdown,
        SourceKind::RXml,
        SourceKind::Markdown,
        SourceKind::Xml,
        SourceKind::Properties,
        SourceKind::Yaml,
        SourceKind::Plain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Markdown => "markdown",
            SourceKind::RMarkdown => "rmarkdown",
            SourceKind::Xml => "xml",
            SourceKind::RXml => "rxml",
            SourceKind::Properties => "properties",
            SourceKind::Yaml => "yaml",
            SourceKind::Plain => "plain",
        }
    }

    /// Kinds whose text may contain inline R.
    pub fn is_scripted(&self) -> bool {
        matches!(self, SourceKind::RMarkdown | SourceKind::RXml)
    }

    /// Kinds transformed by an XSLT stylesheet.
    pub fn is_xml(&self) -> bool {
        matches!(self, SourceKind::Xml | SourceKind::RXml)
    }

    /// Kinds that end up as Markdown before HTML conversion.
    pub fn is_markup(&self) -> bool {
        matches!(
            self,
            SourceKind::Markdown | SourceKind::RMarkdown | SourceKind::Xml | SourceKind::RXml
        )
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SourceKind {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(SourceKind::Markdown),
            "rmarkdown" | "rmd" => Ok(SourceKind::RMarkdown),
            "xml" => Ok(SourceKind::Xml),
            "rxml" => Ok(SourceKind::RXml),
            "properties" => Ok(SourceKind::Properties),
            "yaml" | "yml" => Ok(SourceKind::Yaml),
            "plain" | "text" => Ok(SourceKind::Plain),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

/// Glob patterns that identify each source kind by file name.
///
/// Matching is case-insensitive. Kinds are consulted in [`SourceKind::ALL`]
/// order and the first match wins; a name matching nothing is
/// [`SourceKind::Plain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTypeTable(BTreeMap<SourceKind, Vec<String>>);

impl Default for FileTypeTable {
    fn default() -> Self {
        let globs = |patterns: &[&str]| patterns.iter().map(|p| p.to_string()).collect();
        let mut table = BTreeMap::new();
        table.insert(
            SourceKind::Markdown,
            globs(&[
                "*.md", "*.markdown", "*.mkdown", "*.mdown", "*.mkdn", "*.mkd", "*.mdwn",
                "*.mdtxt", "*.mdtext", "*.text", "*.txt",
            ]),
        );
        table.insert(SourceKind::RMarkdown, globs(&["*.Rmd"]));
        table.insert(SourceKind::Xml, globs(&["*.xml"]));
        table.insert(SourceKind::RXml, globs(&["*.Rxml"]));
        table.insert(SourceKind::Properties, globs(&["*.properties"]));
        table.insert(SourceKind::Yaml, globs(&["*.yaml", "*.yml"]));
        Self(table)
    }
}

impl FileTypeTable {
    /// A table with no patterns; everything is [`SourceKind::Plain`].
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn globs(&self, kind: SourceKind) -> &[String] {
        self.0.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set(&mut self, kind: SourceKind, globs: Vec<String>) {
        self.0.insert(kind, globs);
    }

    /// Infer the kind of `path` from its file name.
    pub fn kind_of(&self, path: &Path) -> SourceKind {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return SourceKind::Plain;
        };

        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::default()
        };

        for kind in SourceKind::ALL {
            for glob in self.globs(kind) {
                match Pattern::new(glob) {
                    Ok(pattern) if pattern.matches_with(name, options) => return kind,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            glob = %glob,
                            kind = %kind,
                            error = %e,
                            "Ignoring invalid file type pattern"
                        );
                    }
                }
            }
        }

        SourceKind::Plain
    }
}

/// Target of a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    /// No export; the result is an HTML fragment for the preview.
    #[default]
    None,
    /// HTML fragment written to a file.
    Html,
    /// Complete XHTML document.
    Xhtml,
    /// The source with variables substituted.
    Markdown,
    /// Typeset document written by an external typesetter.
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::None => "none",
            ExportFormat::Html => "html",
            ExportFormat::Xhtml => "xhtml",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// File extension of the exported file, without the leading dot.
    ///
    /// The Markdown export uses a compound extension so it never overwrites
    /// its own source.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::None => "",
            ExportFormat::Html => "html",
            ExportFormat::Xhtml => "xhtml",
            ExportFormat::Markdown => "out.md",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Check if the export produces a complete document
    pub fn is_complete_document(&self) -> bool {
        matches!(self, ExportFormat::Xhtml | ExportFormat::Pdf)
    }

    /// Check if the export is written by the typesetter rather than returned
    pub fn is_typeset(&self) -> bool {
        matches!(self, ExportFormat::Pdf)
    }

    /// Default output path for `input`: same directory and stem.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match self {
            ExportFormat::None => input.to_path_buf(),
            _ => input.with_extension(self.extension()),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for ExportFormat {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "none" | "preview" => Ok(ExportFormat::None),
            "html" => Ok(ExportFormat::Html),
            "xhtml" => Ok(ExportFormat::Xhtml),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}
