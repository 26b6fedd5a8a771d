#![forbid(unsafe_code)]
//! nbtest: run Jupyter notebooks as tests
//!
//! A notebook passes when its converted script runs to completion without
//! raising an error. This crate provides the executor (convert, run, clean
//! up), the notebook catalog and the `nbtest` command line.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `executor` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod executor;

pub use catalog::{NOTEBOOKS, NotebookCase};
pub use config::RunnerConfig;
pub use errors::NotebookError;
pub use executor::{NotebookRunner, RunOutput, run_notebook_as_test};
