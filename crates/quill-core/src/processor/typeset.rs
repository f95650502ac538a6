/*
 * processor/typeset.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Terminal stage that writes a typeset document.
 */

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use super::{Output, Processor, ProcessorKind, StageError};

const STAGE: &str = "typeset";

/// Placeholder replaced by the path of the XHTML input.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced by the path of the requested output.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Produces a binary document from XHTML.
pub trait Typesetter: Send + Sync {
    fn typeset(&self, document: &str, output: &Path) -> Result<(), StageError>;
}

/// Hands its input to a [`Typesetter`] and reports the written file.
pub struct TypesetProcessor {
    typesetter: Arc<dyn Typesetter>,
    output: PathBuf,
}

impl TypesetProcessor {
    pub fn new(typesetter: Arc<dyn Typesetter>, output: impl Into<PathBuf>) -> Self {
        Self {
            typesetter,
            output: output.into(),
        }
    }
}

impl Processor for TypesetProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Typeset
    }

    fn apply(&self, text: &str) -> Result<Output, StageError> {
        self.typesetter.typeset(text, &self.output)?;
        tracing::info!(output = %self.output.display(), "Typeset document");
        Ok(Output::Written(self.output.clone()))
    }
}

/// Runs an external typesetting program.
///
/// The XHTML is written to a temporary file. Each argument may contain
/// [`INPUT_PLACEHOLDER`] and [`OUTPUT_PLACEHOLDER`].
#[derive(Debug, Clone)]
pub struct CommandTypesetter {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTypesetter {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// ConTeXt, located on the `PATH`.
    pub fn context() -> Option<Self> {
        let program = which::which("context").ok()?;
        let args = [
            "--batchmode",
            "--purgeall",
            "--result={output}",
            "{input}",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();
        Some(Self::new(program, args))
    }

    fn expand(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}

impl Typesetter for CommandTypesetter {
    fn typeset(&self, document: &str, output: &Path) -> Result<(), StageError> {
        let mut input = tempfile::Builder::new()
            .prefix("quill-")
            .suffix(".xhtml")
            .tempfile()
            .map_err(|e| StageError::io(STAGE, e))?;
        input
            .write_all(document.as_bytes())
            .map_err(|e| StageError::io(STAGE, e))?;

        // The child runs in the output directory.
        let output = std::path::absolute(output).map_err(|e| StageError::io(STAGE, e))?;

        let mut command = Command::new(&self.program);
        command.args(self.expand(input.path(), &output));
        if let Some(dir) = output.parent() {
            command.current_dir(dir);
        }

        tracing::debug!(program = %self.program.display(), "Running typesetter");
        let result = command.output().map_err(|e| StageError::io(STAGE, e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(StageError::failed(
                STAGE,
                format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    result.status,
                    stderr.trim()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTypesetter {
        documents: Mutex<Vec<(String, PathBuf)>>,
    }

    impl Typesetter for RecordingTypesetter {
        fn typeset(&self, document: &str, output: &Path) -> Result<(), StageError> {
            self.documents
                .lock()
                .unwrap()
                .push((document.to_string(), output.to_path_buf()));
            Ok(())
        }
    }

    struct FailingTypesetter;

    impl Typesetter for FailingTypesetter {
        fn typeset(&self, _document: &str, _output: &Path) -> Result<(), StageError> {
            Err(StageError::failed(STAGE, "no fonts"))
        }
    }

    #[test]
    fn test_reports_written_file() {
        let typesetter = Arc::new(RecordingTypesetter::default());
        let processor = TypesetProcessor::new(typesetter.clone(), "/out/book.pdf");

        let output = processor.apply("<html/>").unwrap();
        assert_eq!(output, Output::Written(PathBuf::from("/out/book.pdf")));
        assert_eq!(typesetter.documents.lock().unwrap()[0].0, "<html/>");
    }

    #[test]
    fn test_failure_propagates() {
        let processor = TypesetProcessor::new(Arc::new(FailingTypesetter), "x.pdf");
        assert_eq!(processor.apply("").unwrap_err().stage(), "typeset");
    }

    #[test]
    fn test_placeholder_expansion() {
        let typesetter = CommandTypesetter::new(
            "context",
            vec!["--result={output}".into(), "{input}".into()],
        );
        let args = typesetter.expand(Path::new("/tmp/in.xhtml"), Path::new("/out/a.pdf"));
        assert_eq!(args, vec!["--result=/out/a.pdf", "/tmp/in.xhtml"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_typesetter_runs_program() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("copy.pdf");
        let typesetter = CommandTypesetter::new("cp", vec!["{input}".into(), "{output}".into()]);

        typesetter.typeset("<html/>", &output).unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "<html/>");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_typesetter_relative_output() {
        let dir = tempfile::TempDir::new_in(".").unwrap();
        let relative = Path::new(dir.path().file_name().unwrap()).join("book.pdf");
        let typesetter = CommandTypesetter::new(
            "/bin/sh",
            vec![
                "-c".into(),
                "cat \"$0\" > \"$1\"".into(),
                "{input}".into(),
                "{output}".into(),
            ],
        );

        typesetter.typeset("<html/>", &relative).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("book.pdf")).unwrap(),
            "<html/>"
        );
        assert!(!dir.path().join(&relative).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_typesetter_reports_exit_status() {
        let typesetter = CommandTypesetter::new("false", Vec::new());
        let err = typesetter.typeset("", Path::new("out.pdf")).unwrap_err();
        assert!(err.to_string().starts_with("typeset: false exited with"));
    }
}
