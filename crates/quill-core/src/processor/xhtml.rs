/*
 * processor/xhtml.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Completion of an HTML fragment into an XHTML document.
 */

use super::{Output, Processor, ProcessorKind, StageError};
use crate::html::escape_html;

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Definition key whose value becomes the document title.
pub const DOCUMENT_TITLE_KEY: &str = "document.title";

/// Wraps an HTML fragment in a complete XHTML document.
#[derive(Debug, Clone)]
pub struct XhtmlProcessor {
    locale: String,
    title: String,
}

impl XhtmlProcessor {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Processor for XhtmlProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Xhtml
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        let locale = escape_html(&self.locale);
        let title = escape_html(&self.title);

        let mut document = String::with_capacity(text.len() + 256);
        document.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        document.push_str("<!DOCTYPE html>\n");
        document.push_str(&format!(
            "<html xmlns=\"{XHTML_NAMESPACE}\" lang=\"{locale}\" xml:lang=\"{locale}\">\n"
        ));
        document.push_str("<head>\n<meta charset=\"UTF-8\" />\n");
        document.push_str(&format!("<title>{title}</title>\n"));
        document.push_str("</head>\n<body>\n");
        document.push_str(text);
        if !text.ends_with('\n') {
            document.push('\n');
        }
        document.push_str("</body>\n</html>\n");

        Ok(Output::Text(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_fragment() {
        let processor = XhtmlProcessor::new("fr").with_title("Notes & Queries");
        let output = processor.apply("<p>Bonjour</p>\n").unwrap();
        let document = output.text().unwrap();

        assert!(document.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(document.contains("lang=\"fr\" xml:lang=\"fr\""));
        assert!(document.contains("<title>Notes &amp; Queries</title>"));
        assert!(document.contains("<body>\n<p>Bonjour</p>\n</body>"));
        assert!(document.ends_with("</html>\n"));
    }

    #[test]
    fn test_document_is_well_formed_xml() {
        let output = XhtmlProcessor::new("en").apply("<p>a<br />b</p>").unwrap();
        let mut reader = quick_xml::Reader::from_str(output.text().unwrap());
        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("not well formed: {e}"),
            }
        }
    }
}
