/*
 * script/bootstrap.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Preparation of the user's R bootstrap script.
 */

use std::path::Path;

use super::ScriptError;
use super::variables::ScriptVariableProcessor;
use crate::definition::DefinitionMap;
use crate::sigils::SigilOperator;

/// Definition key bound to the R working directory while bootstrapping.
pub const WORKING_DIRECTORY_KEY: &str = "application.r.working.directory";

/// Substitute script variables into a bootstrap script.
///
/// Every definition is available, plus [`WORKING_DIRECTORY_KEY`] bound to
/// `working_dir`. With the script operator the working directory is
/// referenced as `v$application$r$working$directory`, with `\` separators
/// written as `/`. A script variable with no definition is an error.
pub fn prepare_bootstrap(
    script: &str,
    definitions: &DefinitionMap,
    working_dir: &Path,
    operator: &SigilOperator,
) -> Result<String, ScriptError> {
    let mut bound = definitions.clone();
    bound.insert(WORKING_DIRECTORY_KEY.to_string(), r_path(working_dir));

    let variables = ScriptVariableProcessor::new(&bound, operator);
    if let Some(name) = variables.unbound_names(script).into_iter().next() {
        return Err(ScriptError::UnboundVariable(name));
    }

    Ok(variables.substitute(script))
}

/// `path` with forward slashes, which R accepts on every platform.
fn r_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
