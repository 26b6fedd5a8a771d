//! Error taxonomy for converting and running a notebook.
//!
//! Every variant names the failing step so a conversion failure is never
//! reported as an execution failure (or vice versa).

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while running a single notebook as a test.
#[derive(Debug, Error, Diagnostic)]
pub enum NotebookError {
    #[error("failed to start converter `{program}` for {}: {source}", notebook.display())]
    #[diagnostic(
        code(nbtest::convert::spawn),
        help("is `jupyter nbconvert` installed and on PATH? pass --converter to use another tool")
    )]
    ConverterSpawn {
        notebook: PathBuf,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{} already exists; refusing to convert {} over it", script.display(), notebook.display())]
    #[diagnostic(
        code(nbtest::convert::occupied),
        help("move or delete the existing file, it would be overwritten by the generated script")
    )]
    ScriptPathOccupied { notebook: PathBuf, script: PathBuf },

    #[error("converter failed on {} (exit code {})", notebook.display(), display_code(*code))]
    #[diagnostic(code(nbtest::convert::failed))]
    ConversionFailed {
        notebook: PathBuf,
        code: Option<i32>,
        #[help]
        stderr: Option<String>,
    },

    #[error("converter reported success but {} was not written", script.display())]
    #[diagnostic(
        code(nbtest::convert::missing_script),
        help("check that --script-ext matches the notebook kernel language")
    )]
    ScriptMissing { notebook: PathBuf, script: PathBuf },

    #[error("cannot mark {} executable: {source}", script.display())]
    #[diagnostic(code(nbtest::script::permissions))]
    Permissions {
        script: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot execute {}: {source}", script.display())]
    #[diagnostic(
        code(nbtest::script::spawn),
        help("generated scripts need a shebang line naming their interpreter")
    )]
    ScriptSpawn {
        script: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} raised an error (exit code {})", notebook.display(), display_code(*code))]
    #[diagnostic(code(nbtest::script::failed))]
    ScriptFailed {
        notebook: PathBuf,
        code: Option<i32>,
        #[help]
        stderr: Option<String>,
    },
}

impl NotebookError {
    /// True when the notebook never got as far as running.
    pub fn is_conversion_failure(&self) -> bool {
        matches!(
            self,
            NotebookError::ConverterSpawn { .. }
                | NotebookError::ConversionFailed { .. }
                | NotebookError::ScriptMissing { .. }
        )
    }
}

fn display_code(code: Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none, terminated by signal".to_string(),
    }
}

/// Trimmed stderr, or `None` when the process wrote nothing useful.
pub(crate) fn captured_stderr(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}
