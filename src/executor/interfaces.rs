//! Executor I/O boundary interfaces
//!
//! The two external collaborators of a notebook run:
//! - Conversion (notebook → script on disk, e.g. `jupyter nbconvert`)
//! - Execution (run the generated script, capture its output)
//!
//! Default implementations shell out. Tests substitute their own to observe
//! which steps ran.

use std::path::Path;
use std::process::{Command, Output};

use crate::config::RunnerConfig;
use crate::errors::{NotebookError, captured_stderr};

// ============================================================================
// Converter Interface
// ============================================================================

/// Turn a notebook into a runnable script next to it.
///
/// The contract is only "given `dir/name.ipynb`, write `dir/name.<ext>`".
pub trait ScriptConverter {
    /// Convert `notebook` in place.
    fn convert(&self, notebook: &Path) -> Result<(), NotebookError>;

    /// Extension of the script `convert` writes, without the dot.
    fn script_extension(&self) -> &str;
}

// ============================================================================
// Executor Interface
// ============================================================================

/// Run a generated script.
pub trait ScriptExecutor {
    /// Run `script` (an absolute path) with `workdir` as its working directory.
    /// Returns the captured output whatever the exit status.
    fn execute(&self, script: &Path, workdir: &Path) -> Result<Output, NotebookError>;
}

// ============================================================================
// Default Implementations
// ============================================================================

/// Converter backed by an external command with the notebook path appended.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    script_ext: String,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            script_ext: crate::config::DEFAULT_SCRIPT_EXT.to_string(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            program: config.converter_program.clone(),
            args: config.converter_args.clone(),
            script_ext: config.script_ext.clone(),
        }
    }

    /// Append a leading argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandConverter {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

impl ScriptConverter for CommandConverter {
    fn convert(&self, notebook: &Path) -> Result<(), NotebookError> {
        tracing::debug!(program = %self.program, args = ?self.args, notebook = %notebook.display(), "converting");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(notebook)
            .output()
            .map_err(|source| NotebookError::ConverterSpawn {
                notebook: notebook.to_path_buf(),
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(NotebookError::ConversionFailed {
                notebook: notebook.to_path_buf(),
                code: output.status.code(),
                stderr: captured_stderr(&output.stderr),
            })
        }
    }

    fn script_extension(&self) -> &str {
        &self.script_ext
    }
}

/// Executes the script directly; it must carry a shebang.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ScriptExecutor for ProcessExecutor {
    fn execute(&self, script: &Path, workdir: &Path) -> Result<Output, NotebookError> {
        Command::new(script)
            .current_dir(workdir)
            .output()
            .map_err(|source| NotebookError::ScriptSpawn {
                script: script.to_path_buf(),
                source,
            })
    }
}
