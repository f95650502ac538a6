/*
 * processor/chain.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Ordered list of processors and the driver that runs it.
 */

use std::sync::Arc;

use super::{Output, Processor, ProcessorKind, StageError};
use crate::status::{NoopNotifier, StatusNotifier};

/// An ordered list of processors.
///
/// Processors run in insertion order. A chain is cheap to clone: the
/// processors themselves are shared.
#[derive(Clone)]
pub struct ProcessorChain {
    processors: Vec<Arc<dyn Processor>>,
    notifier: Arc<dyn StatusNotifier>,
}

impl Default for ProcessorChain {
    fn default() -> Self {
        Self::new(Arc::new(NoopNotifier))
    }
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ProcessorChain {
    /// Create an empty chain reporting stage failures to `notifier`.
    pub fn new(notifier: Arc<dyn StatusNotifier>) -> Self {
        Self {
            processors: Vec::new(),
            notifier,
        }
    }

    /// Add a processor to the end of the chain.
    pub fn push(&mut self, processor: Arc<dyn Processor>) {
        self.processors.push(processor);
    }

    /// Add multiple processors to the end of the chain.
    pub fn extend(&mut self, processors: impl IntoIterator<Item = Arc<dyn Processor>>) {
        self.processors.extend(processors);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn processors(&self) -> &[Arc<dyn Processor>] {
        &self.processors
    }

    /// Kinds of the processors, in order.
    pub fn kinds(&self) -> Vec<ProcessorKind> {
        self.processors.iter().map(|p| p.kind()).collect()
    }

    /// Names of the processors, in order.
    pub fn names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Kinds joined by arrows, e.g. `definition -> markdown`.
    pub fn describe(&self) -> String {
        self.kinds()
            .iter()
            .map(ProcessorKind::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn contains(&self, kind: ProcessorKind) -> bool {
        self.processors.iter().any(|p| p.kind() == kind)
    }

    /// A new chain without processors of `kind`.
    ///
    /// The remaining processors keep their relative order; `self` is
    /// unchanged.
    pub fn remove(&self, kind: ProcessorKind) -> Self {
        Self {
            processors: self
                .processors
                .iter()
                .filter(|p| p.kind() != kind)
                .cloned()
                .collect(),
            notifier: Arc::clone(&self.notifier),
        }
    }

    /// Run every processor, falling back when a stage fails.
    ///
    /// A failing stage is reported to the notifier and its input is passed
    /// to the next stage unchanged. Processing stops early when a stage
    /// reports [`Output::Written`].
    pub fn apply(&self, text: impl Into<String>) -> Output {
        let mut text = text.into();
        for processor in &self.processors {
            tracing::debug!(processor = processor.name(), "Applying processor");
            match processor.apply(&text) {
                Ok(Output::Text(next)) => text = next,
                Ok(written @ Output::Written(_)) => return written,
                Err(e) => {
                    tracing::warn!(
                        processor = processor.name(),
                        error = %e,
                        "Processor failed; passing input through"
                    );
                    self.notifier.error(&e.to_string());
                }
            }
        }
        Output::Text(text)
    }

    /// Run every processor, stopping at the first failure.
    pub fn try_apply(&self, text: impl Into<String>) -> Result<Output, StageError> {
        let mut text = text.into();
        for processor in &self.processors {
            tracing::debug!(processor = processor.name(), "Applying processor");
            match processor.apply(&text)? {
                Output::Text(next) => text = next,
                written @ Output::Written(_) => return Ok(written),
            }
        }
        Ok(Output::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{CollectingNotifier, StatusLevel};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct Append {
        kind: ProcessorKind,
        suffix: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Processor for Append {
        fn kind(&self) -> ProcessorKind {
            self.kind
        }

        fn apply(&self, text: &str) -> Result<Output, StageError> {
            self.order.lock().unwrap().push(self.suffix);
            Ok(Output::Text(format!("{text}{}", self.suffix)))
        }
    }

    struct Fail;

    impl Processor for Fail {
        fn kind(&self) -> ProcessorKind {
            ProcessorKind::Xml
        }

        fn apply(&self, _text: &str) -> Result<Output, StageError> {
            Err(StageError::failed("xml", "no stylesheet"))
        }
    }

    struct Write;

    impl Processor for Write {
        fn kind(&self) -> ProcessorKind {
            ProcessorKind::Typeset
        }

        fn apply(&self, _text: &str) -> Result<Output, StageError> {
            Ok(Output::Written(PathBuf::from("out.pdf")))
        }
    }

    fn append(
        kind: ProcessorKind,
        suffix: &'static str,
        order: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn Processor> {
        Arc::new(Append {
            kind,
            suffix,
            order: Arc::clone(order),
        })
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_chain_is_send_sync() {
        assert_send_sync::<ProcessorChain>();
    }

    #[test]
    fn test_empty_chain_returns_input() {
        let chain = ProcessorChain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.apply("abc"), Output::Text("abc".into()));
    }

    #[test]
    fn test_processors_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ProcessorChain::default();
        chain.push(append(ProcessorKind::Definition, "1", &order));
        chain.push(append(ProcessorKind::Markdown, "2", &order));
        chain.push(append(ProcessorKind::Preview, "3", &order));

        assert_eq!(chain.apply("x"), Output::Text("x123".into()));
        assert_eq!(*order.lock().unwrap(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_remove_preserves_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ProcessorChain::default();
        chain.extend([
            append(ProcessorKind::Definition, "d", &order),
            append(ProcessorKind::CaretInsertion, "c", &order),
            append(ProcessorKind::Markdown, "m", &order),
            append(ProcessorKind::CaretReplacement, "r", &order),
            append(ProcessorKind::Preview, "p", &order),
        ]);

        let trimmed = chain.remove(ProcessorKind::CaretInsertion);
        assert_eq!(
            trimmed.kinds(),
            vec![
                ProcessorKind::Definition,
                ProcessorKind::Markdown,
                ProcessorKind::CaretReplacement,
                ProcessorKind::Preview,
            ]
        );
        assert_eq!(chain.len(), 5);
        assert_eq!(trimmed.apply(""), Output::Text("dmrp".into()));
    }

    #[test]
    fn test_remove_absent_kind_is_a_copy() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ProcessorChain::default();
        chain.push(append(ProcessorKind::Markdown, "m", &order));
        assert_eq!(chain.remove(ProcessorKind::Xml).kinds(), chain.kinds());
    }

    #[test]
    fn test_failed_stage_passes_input_through() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let notifier = Arc::new(CollectingNotifier::new());
        let mut chain = ProcessorChain::new(notifier.clone());
        chain.push(append(ProcessorKind::Definition, "a", &order));
        chain.push(Arc::new(Fail));
        chain.push(append(ProcessorKind::Markdown, "b", &order));

        assert_eq!(chain.apply("x"), Output::Text("xab".into()));

        let errors = notifier.at_least(StatusLevel::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "xml: no stylesheet");
    }

    #[test]
    fn test_try_apply_stops_on_failure() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ProcessorChain::default();
        chain.push(Arc::new(Fail));
        chain.push(append(ProcessorKind::Markdown, "b", &order));

        let err = chain.try_apply("x").unwrap_err();
        assert_eq!(err.stage(), "xml");
        assert!(order.lock().unwrap().is_empty());
    }

    #[test]
    fn test_written_stops_chain() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ProcessorChain::default();
        chain.push(Arc::new(Write));
        chain.push(append(ProcessorKind::Identity, "never", &order));

        assert_eq!(chain.apply("x"), Output::Written(PathBuf::from("out.pdf")));
        assert!(order.lock().unwrap().is_empty());
    }

    #[test]
    fn test_names() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ProcessorChain::default();
        chain.push(append(ProcessorKind::ScriptVariable, "", &order));
        assert_eq!(chain.names(), vec!["script-variable"]);
        assert!(chain.contains(ProcessorKind::ScriptVariable));
    }
}
