//! Core document pipeline for quill
//!
//! This crate turns a source document (Markdown, R Markdown, XML or plain
//! text) into a rendered output by passing it through an ordered chain of
//! text processors, substituting user-defined variables and optionally
//! evaluating inline R expressions on the way.
//!
//! # Architecture
//!
//! The pipeline is organized around these key types:
//!
//! - [`DefinitionTree`] - Hierarchical variable definitions loaded from YAML
//! - [`Interpolator`] - Resolves references between definitions
//! - [`SigilOperator`] - Delimiters that mark a variable reference
//! - [`ProcessorChain`] - Ordered processors applied to the document text
//! - [`ProcessorFactory`] - Builds the chain for a source kind and export format
//! - [`ScriptContext`] - R evaluator plus its bounded result cache
//! - [`ExportWorker`] - Runs exports on a background thread
//!
//! # Flow
//!
//! ```text
//! YAML -> DefinitionTree -> flat map -> interpolate -> ProcessorContext
//!      -> ProcessorFactory -> ProcessorChain::apply -> preview / file
//! ```

pub mod definition;
pub mod error;
pub mod export;
pub mod format;
pub mod html;
pub mod interpolate;
pub mod processor;
pub mod script;
pub mod settings;
pub mod sigils;
pub mod status;

pub use definition::{DefinitionMap, DefinitionSession, DefinitionTree, NodeId, SearchMode};
pub use error::{QuillError, Result};
pub use export::{ExportError, ExportHandle, ExportWorker};
pub use format::{ExportFormat, FileTypeTable, SourceKind};
pub use interpolate::{InterpolationError, Interpolator, interpolate};
pub use processor::{
    Output, Processor, ProcessorChain, ProcessorContext, ProcessorFactory, ProcessorKind,
    create_processors,
};
pub use script::{ScriptContext, ScriptError, ScriptEvaluator};
pub use settings::Settings;
pub use sigils::{SigilOperator, Sigils};
pub use status::{StatusEvent, StatusLevel, StatusNotifier};
