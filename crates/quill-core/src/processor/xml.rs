/*
 * processor/xml.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * XML documents transformed by their own stylesheet.
 */

//! XML processing.
//!
//! An XML document names its stylesheet with a processing instruction near
//! the top of the file:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <?xml-stylesheet type="text/xsl" href="book.xsl"?>
//! <book>...</book>
//! ```
//!
//! The `href` is resolved against the document's directory and the
//! document is handed to an [`XsltTransformer`]. The transformed text
//! continues down the chain (usually as Markdown).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, LazyLock};

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use super::{Output, Processor, ProcessorKind, StageError};

const STAGE: &str = "xml";

/// Processing instruction that names the stylesheet.
const STYLESHEET_TARGET: &str = "xml-stylesheet";

/// Number of leading events searched for the stylesheet instruction.
const STYLESHEET_SEARCH_EVENTS: usize = 10;

static HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex pattern for href")
});

/// Applies an XSLT stylesheet to a document.
pub trait XsltTransformer: Send + Sync {
    fn transform(&self, document: &str, stylesheet: &Path) -> Result<String, StageError>;
}

/// Find the `href` of the `xml-stylesheet` instruction among the first
/// few events of `document`.
pub fn find_stylesheet(document: &str) -> Result<Option<String>, StageError> {
    let mut reader = Reader::from_str(document);

    for _ in 0..STYLESHEET_SEARCH_EVENTS {
        match reader.read_event() {
            Ok(Event::PI(pi)) => {
                let instruction = String::from_utf8_lossy(&pi);
                let mut parts = instruction.trim().splitn(2, char::is_whitespace);
                if parts.next() != Some(STYLESHEET_TARGET) {
                    continue;
                }
                let pseudo_attributes = parts.next().unwrap_or_default();
                let href = HREF_PATTERN.captures(pseudo_attributes).and_then(|caps| {
                    caps.get(1)
                        .or_else(|| caps.get(2))
                        .map(|m| m.as_str().to_string())
                });
                return Ok(href);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(StageError::failed(
                    STAGE,
                    format!("malformed XML at byte {}: {e}", reader.buffer_position()),
                ));
            }
        }
    }

    Ok(None)
}

/// Transforms an XML document with the stylesheet it names.
pub struct XmlProcessor {
    base_dir: PathBuf,
    transformer: Arc<dyn XsltTransformer>,
}

impl XmlProcessor {
    /// `base_dir` is the directory stylesheet paths are relative to.
    pub fn new(base_dir: impl Into<PathBuf>, transformer: Arc<dyn XsltTransformer>) -> Self {
        Self {
            base_dir: base_dir.into(),
            transformer,
        }
    }
}

impl Processor for XmlProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Xml
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        if text.trim().is_empty() {
            return Ok(Output::Text(String::new()));
        }

        let href = find_stylesheet(text)?.ok_or_else(|| {
            StageError::failed(STAGE, "document has no xml-stylesheet processing instruction")
        })?;
        let stylesheet = self.base_dir.join(&href);
        tracing::debug!(stylesheet = %stylesheet.display(), "Applying stylesheet");

        self.transformer
            .transform(text, &stylesheet)
            .map(Output::Text)
    }
}

/// Runs the `xsltproc` command.
#[derive(Debug, Clone)]
pub struct XsltprocTransformer {
    program: PathBuf,
}

impl XsltprocTransformer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate `xsltproc` on the `PATH`.
    pub fn discover() -> Option<Self> {
        which::which("xsltproc").ok().map(Self::new)
    }
}

impl XsltTransformer for XsltprocTransformer {
    fn transform(&self, document: &str, stylesheet: &Path) -> Result<String, StageError> {
        let mut input = tempfile::Builder::new()
            .suffix(".xml")
            .tempfile()
            .map_err(|e| StageError::io(STAGE, e))?;
        input
            .write_all(document.as_bytes())
            .map_err(|e| StageError::io(STAGE, e))?;

        let output = Command::new(&self.program)
            .arg(stylesheet)
            .arg(input.path())
            .output()
            .map_err(|e| StageError::io(STAGE, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StageError::failed(
                STAGE,
                format!("xsltproc failed: {}", stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const DOCUMENT: &str = "<?xml version=\"1.0\"?>\n\
        <?xml-stylesheet type=\"text/xsl\" href=\"style/book.xsl\"?>\n\
        <book><title>Quill</title></book>\n";

    #[derive(Default)]
    struct RecordingTransformer {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl XsltTransformer for RecordingTransformer {
        fn transform(&self, document: &str, stylesheet: &Path) -> Result<String, StageError> {
            self.calls.lock().unwrap().push(stylesheet.to_path_buf());
            Ok(format!("# transformed {} bytes", document.len()))
        }
    }

    #[test]
    fn test_find_stylesheet() {
        assert_eq!(
            find_stylesheet(DOCUMENT).unwrap().as_deref(),
            Some("style/book.xsl")
        );
    }

    #[test]
    fn test_single_quoted_href() {
        let doc = "<?xml-stylesheet href='a.xsl' type='text/xsl'?><r/>";
        assert_eq!(find_stylesheet(doc).unwrap().as_deref(), Some("a.xsl"));
    }

    #[test]
    fn test_other_instructions_are_skipped() {
        let doc = "<?other data?><?xml-stylesheet href=\"s.xsl\"?><r/>";
        assert_eq!(find_stylesheet(doc).unwrap().as_deref(), Some("s.xsl"));
    }

    #[test]
    fn test_missing_stylesheet() {
        assert_eq!(find_stylesheet("<r><a/></r>").unwrap(), None);
    }

    #[test]
    fn test_stylesheet_beyond_search_window_is_ignored() {
        let mut doc = String::from("<r>");
        for _ in 0..STYLESHEET_SEARCH_EVENTS {
            doc.push_str("<a/>");
        }
        doc.push_str("<?xml-stylesheet href=\"late.xsl\"?></r>");
        assert_eq!(find_stylesheet(&doc).unwrap(), None);
    }

    #[test]
    fn test_processor_resolves_relative_to_base_dir() {
        let transformer = Arc::new(RecordingTransformer::default());
        let processor = XmlProcessor::new("/books", transformer.clone());

        let output = processor.apply(DOCUMENT).unwrap();
        assert!(output.text().unwrap().starts_with("# transformed"));
        assert_eq!(
            *transformer.calls.lock().unwrap(),
            vec![PathBuf::from("/books/style/book.xsl")]
        );
    }

    #[test]
    fn test_missing_instruction_is_stage_error() {
        let processor = XmlProcessor::new("/", Arc::new(RecordingTransformer::default()));
        let err = processor.apply("<r/>").unwrap_err();
        assert_eq!(err.stage(), "xml");
    }

    #[test]
    fn test_empty_document_passes() {
        let processor = XmlProcessor::new("/", Arc::new(RecordingTransformer::default()));
        assert_eq!(processor.apply("  ").unwrap(), Output::Text(String::new()));
    }
}
