//! CLI module for nbtest
//!
//! ## Commands
//!
//! - `test` - Run every notebook in the catalog (pytest-style)
//! - `run <notebook>` - Convert and run a single notebook
//! - `list` - Show the catalog with skip reasons
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod test_runner;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::catalog::NOTEBOOKS;
use crate::config::{DEFAULT_CONVERTER, DEFAULT_SCRIPT_EXT, RunnerConfig};
use crate::executor::NotebookRunner;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run Jupyter notebooks as tests
#[derive(Parser, Debug)]
#[command(name = "nbtest")]
#[command(version = VERSION)]
#[command(about = "Run Jupyter notebooks as tests (pass = no errors at runtime)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Converter settings shared by `test` and `run`
#[derive(Args, Debug, Clone)]
pub struct ConverterArgs {
    /// Converter command line; the notebook path is appended
    #[arg(long, value_name = "CMD", default_value = DEFAULT_CONVERTER)]
    pub converter: String,
    /// Extension of the script the converter writes
    #[arg(long = "script-ext", value_name = "EXT", default_value = DEFAULT_SCRIPT_EXT)]
    pub script_ext: String,
}

impl ConverterArgs {
    pub fn to_config(&self) -> RunnerConfig {
        RunnerConfig::new()
            .with_converter_command(&self.converter)
            .with_script_ext(&self.script_ext)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every notebook in the catalog
    Test {
        /// Directory the catalog paths are relative to
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
        /// Stop on first failure
        #[arg(short = 'x', long = "exitfirst")]
        stop_on_fail: bool,
        /// Only run tests whose name contains EXPR
        #[arg(short = 'k', value_name = "EXPR")]
        filter: Option<String>,
        #[command(flatten)]
        converter: ConverterArgs,
    },

    /// Convert and run a single notebook
    Run {
        /// Notebook to run
        #[arg(value_name = "NOTEBOOK")]
        notebook: PathBuf,
        #[command(flatten)]
        converter: ConverterArgs,
    },

    /// List the notebook catalog
    List {
        /// Directory the catalog paths are relative to
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Test {
            root,
            verbose,
            stop_on_fail,
            filter,
            converter,
        } => {
            let options = test_runner::SessionOptions {
                root,
                verbose,
                stop_on_fail,
                filter,
            };
            test_runner::run_tests(&converter.to_config(), &options)
        }
        Command::Run { notebook, converter } => run_notebook(&notebook, &converter.to_config()),
        Command::List { root } => {
            list_notebooks(&root);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Handle the `run` subcommand: one notebook, failures rendered as diagnostics.
fn run_notebook(notebook: &Path, config: &RunnerConfig) -> CliResult<ExitCode> {
    match NotebookRunner::from_config(config).run(notebook) {
        Ok(output) => {
            print!("{}", output.stdout);
            eprintln!(
                "\x1b[32mPASSED\x1b[0m {} ({:.2}s)",
                notebook.display(),
                output.duration.as_secs_f64()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(CliError::failure(format!("{:?}", miette::Report::new(e)))),
    }
}

fn list_notebooks(root: &Path) {
    for case in NOTEBOOKS {
        let path = case.resolve(root);
        match case.skip {
            Some(reason) => println!("{} {} \x1b[33m[skip: {}]\x1b[0m", case.name, path.display(), reason),
            None => println!("{} {}", case.name, path.display()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
