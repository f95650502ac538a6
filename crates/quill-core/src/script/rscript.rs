/*
 * script/rscript.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Evaluation of R expressions through an Rscript subprocess.
 */

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::ScriptError;
use super::context::ScriptEvaluator;

/// Environment variable naming an R installation or Rscript binary.
pub const QUILL_R_ENV: &str = "QUILL_R";

// ============================================================================
// Rscript Discovery
// ============================================================================

/// Find the Rscript binary on the system.
///
/// Searches in this order:
/// 1. `QUILL_R` environment variable - can be:
///    - Path to R installation directory (looks for `bin/Rscript`)
///    - Direct path to Rscript binary
/// 2. System PATH via `which`
pub fn find_rscript() -> Option<PathBuf> {
    if let Ok(quill_r) = std::env::var(QUILL_R_ENV) {
        if let Some(rscript) = rscript_in(Path::new(&quill_r)) {
            return Some(rscript);
        }
        tracing::warn!(path = %quill_r, "{QUILL_R_ENV} does not point to an R installation");
    }

    which::which("Rscript").ok()
}

/// Resolve an explicit R location to its Rscript binary.
fn rscript_in(path: &Path) -> Option<PathBuf> {
    if path.is_file() && is_rscript(path) {
        return Some(path.to_path_buf());
    }

    if path.is_dir() {
        // Standard R installation layout first.
        let in_bin = path.join("bin").join(rscript_name());
        if in_bin.is_file() {
            return Some(in_bin);
        }
        let direct = path.join(rscript_name());
        if direct.is_file() {
            return Some(direct);
        }
    }
    None
}

fn rscript_name() -> &'static str {
    #[cfg(windows)]
    {
        "Rscript.exe"
    }
    #[cfg(not(windows))]
    {
        "Rscript"
    }
}

fn is_rscript(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name == "Rscript" || name == "Rscript.exe")
        .unwrap_or(false)
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluates each expression in a fresh `Rscript --vanilla` process.
///
/// The bootstrap script is kept as a prelude and run before every
/// expression. The expression's value is printed with `format()` and its
/// elements joined by spaces.
#[derive(Debug, Clone)]
pub struct RscriptEvaluator {
    rscript: PathBuf,
    working_dir: PathBuf,
    prelude: String,
}

impl RscriptEvaluator {
    pub fn new(rscript: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            rscript: rscript.into(),
            working_dir: working_dir.into(),
            prelude: String::new(),
        }
    }

    /// Locate Rscript with [`find_rscript`].
    pub fn discover(working_dir: impl Into<PathBuf>) -> Result<Self, ScriptError> {
        let rscript = find_rscript().ok_or_else(|| {
            ScriptError::RuntimeNotFound(
                "Rscript (install R from https://www.r-project.org/ or set QUILL_R)".to_string(),
            )
        })?;
        tracing::debug!(rscript = %rscript.display(), "Found Rscript");
        Ok(Self::new(rscript, working_dir))
    }

    pub fn rscript(&self) -> &Path {
        &self.rscript
    }

    fn program(&self, expression: &str) -> String {
        format!(
            "{prelude}\n.quill_value <- {{\n{expression}\n}}\n\
             cat(paste(format(.quill_value), collapse = \" \"))\n",
            prelude = self.prelude,
        )
    }

    fn run(&self, program: &str, expression: &str) -> Result<String, ScriptError> {
        let mut file = tempfile::Builder::new()
            .prefix("quill-")
            .suffix(".R")
            .tempfile()?;
        file.write_all(program.as_bytes())?;

        let output = Command::new(&self.rscript)
            .arg("--vanilla")
            .arg(file.path())
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScriptError::evaluation_failed(expression, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl ScriptEvaluator for RscriptEvaluator {
    fn name(&self) -> &str {
        "Rscript"
    }

    fn evaluate(&mut self, expression: &str) -> Result<String, ScriptError> {
        let program = self.program(expression);
        self.run(&program, expression)
    }

    /// Check that the script runs, then keep it as the prelude.
    fn bootstrap(&mut self, script: &str) -> Result<(), ScriptError> {
        self.run(script, script)?;
        self.prelude = script.to_string();
        Ok(())
    }
}
