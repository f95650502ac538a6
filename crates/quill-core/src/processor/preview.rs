/*
 * processor/preview.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Terminal stage that hands HTML to the preview.
 */

use std::sync::Arc;

use super::{Output, Processor, ProcessorKind, StageError};

/// Receives the HTML produced for the live preview.
pub trait PreviewSink: Send + Sync {
    fn render(&self, html: &str);
}

/// Sends its input to a [`PreviewSink`] and returns it unchanged.
pub struct PreviewProcessor {
    sink: Arc<dyn PreviewSink>,
}

impl PreviewProcessor {
    pub fn new(sink: Arc<dyn PreviewSink>) -> Self {
        Self { sink }
    }
}

impl Processor for PreviewProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Preview
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        self.sink.render(text);
        Ok(Output::Text(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl PreviewSink for Recorder {
        fn render(&self, html: &str) {
            self.0.lock().unwrap().push(html.to_string());
        }
    }

    #[test]
    fn test_preview_receives_html() {
        let sink = Arc::new(Recorder::default());
        let processor = PreviewProcessor::new(sink.clone());

        let output = processor.apply("<p>x</p>").unwrap();
        assert_eq!(output.text(), Some("<p>x</p>"));
        assert_eq!(*sink.0.lock().unwrap(), vec!["<p>x</p>".to_string()]);
    }
}
