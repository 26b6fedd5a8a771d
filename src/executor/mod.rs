//! Notebook executor
//!
//! Runs one notebook as a test: convert it to a script, mark the script
//! executable, run it from the notebook's directory and delete it again.
//! A zero exit status is a pass.
//!
//! ## Process state
//!
//! Neither the working directory nor `PATH` of this process is modified.
//! The script is launched through its absolute path with the notebook
//! directory as the child's working directory, so concurrent runs do not
//! interfere.
//!
//! ## Cleanup
//!
//! The generated script is claimed by a [`GeneratedScript`] guard before the
//! converter starts and is removed on every exit path, including a failed
//! conversion that left a partial file behind. If a file already sits at the
//! script path the run stops before converting and leaves that file alone.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod interfaces;
pub mod script;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use crate::config::RunnerConfig;
use crate::errors::{NotebookError, captured_stderr};

pub use interfaces::{CommandConverter, ProcessExecutor, ScriptConverter, ScriptExecutor};
pub use script::{GeneratedScript, notebook_dir, script_path_for};

/// Output of a notebook whose script exited cleanly.
#[derive(Debug)]
pub struct RunOutput {
    pub notebook: PathBuf,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Converts and runs notebooks through a pair of collaborators.
#[derive(Debug, Clone, Default)]
pub struct NotebookRunner<C = CommandConverter, E = ProcessExecutor> {
    converter: C,
    executor: E,
}

impl NotebookRunner {
    /// Runner shelling out to the converter named in `config`.
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(CommandConverter::from_config(config), ProcessExecutor)
    }
}

impl<C: ScriptConverter, E: ScriptExecutor> NotebookRunner<C, E> {
    pub fn new(converter: C, executor: E) -> Self {
        Self { converter, executor }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Convert `notebook`, run the resulting script and clean up.
    #[tracing::instrument(skip_all, fields(notebook = %notebook.display()))]
    pub fn run(&self, notebook: &Path) -> Result<RunOutput, NotebookError> {
        let start = Instant::now();

        let workdir = notebook_dir(notebook);
        let script = GeneratedScript::claim(notebook, script_path_for(notebook, self.converter.script_extension()))?;

        self.converter.convert(notebook)?;
        if !script.exists() {
            return Err(NotebookError::ScriptMissing {
                notebook: notebook.to_path_buf(),
                script: script.path().to_path_buf(),
            });
        }

        script.make_executable()?;
        let launch_path = script.absolute_path().map_err(|source| NotebookError::ScriptSpawn {
            script: script.path().to_path_buf(),
            source,
        })?;

        tracing::debug!(script = %launch_path.display(), workdir = %workdir.display(), "running generated script");
        let output = self.executor.execute(&launch_path, &workdir)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !stdout.is_empty() {
            tracing::debug!(%stdout, "script output");
        }

        if !output.status.success() {
            return Err(NotebookError::ScriptFailed {
                notebook: notebook.to_path_buf(),
                code: output.status.code(),
                stderr: captured_stderr(&output.stderr),
            });
        }

        let duration = start.elapsed();
        tracing::info!(duration_ms = duration.as_millis() as u64, "notebook passed");
        Ok(RunOutput {
            notebook: notebook.to_path_buf(),
            status: output.status,
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration,
        })
    }
}

/// Convert the notebook with `jupyter nbconvert`, run it, and clean up.
///
/// `Ok` means the notebook's code ran without raising an error.
pub fn run_notebook_as_test(notebook: impl AsRef<Path>) -> Result<RunOutput, NotebookError> {
    NotebookRunner::from_config(&RunnerConfig::default()).run(notebook.as_ref())
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::env;
    use std::fs;
    use std::process::Output;
    use tempfile::TempDir;

    const FAKE_NBCONVERT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fake_nbconvert.sh");

    fn fake_runner() -> NotebookRunner {
        NotebookRunner::new(CommandConverter::new("sh").arg(FAKE_NBCONVERT), ProcessExecutor)
    }

    /// Write a "notebook" the fake converter turns into the given shell script.
    fn notebook(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        path
    }

    #[test]
    fn test_passing_notebook_cleans_up() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("dir");
        fs::create_dir(&dir).unwrap();
        let nb = notebook(&dir, "a.ipynb", "echo hello");
        let cwd_before = env::current_dir().unwrap();

        let output = fake_runner().run(&nb).unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert!(!dir.join("a.py").exists());
        assert_eq!(env::current_dir().unwrap(), cwd_before);
    }

    #[test]
    fn test_failing_notebook_reports_failure_and_cleans_up() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("dir");
        fs::create_dir(&dir).unwrap();
        let nb = notebook(&dir, "b.ipynb", "echo 'Traceback: boom' >&2\nexit 1");
        let cwd_before = env::current_dir().unwrap();

        let err = fake_runner().run(&nb).unwrap_err();

        match err {
            NotebookError::ScriptFailed { code, stderr, notebook } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr.as_deref(), Some("Traceback: boom"));
                assert_eq!(notebook, nb);
            }
            other => panic!("expected ScriptFailed, got {:?}", other),
        }
        assert!(!dir.join("b.py").exists());
        assert_eq!(env::current_dir().unwrap(), cwd_before);
    }

    #[test]
    fn test_script_runs_in_notebook_directory() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("chemistry");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("molecule.xyz"), "H 0 0 0\n").unwrap();
        let nb = notebook(&dir, "uses_data.ipynb", "test -f molecule.xyz");

        assert!(fake_runner().run(&nb).is_ok());
    }

    #[test]
    fn test_missing_notebook_is_conversion_failure() {
        let root = TempDir::new().unwrap();
        let nb = root.path().join("absent.ipynb");

        let err = fake_runner().run(&nb).unwrap_err();

        assert!(err.is_conversion_failure(), "got {:?}", err);
        assert!(matches!(err, NotebookError::ConversionFailed { code: Some(1), .. }));
        assert!(!root.path().join("absent.py").exists());
    }

    #[test]
    fn test_absent_converter_fails_fast() {
        let root = TempDir::new().unwrap();
        let nb = notebook(root.path(), "a.ipynb", "exit 0");
        let runner = NotebookRunner::new(CommandConverter::new("nbtest-no-such-converter-12345"), ProcessExecutor);

        let err = runner.run(&nb).unwrap_err();

        assert!(matches!(err, NotebookError::ConverterSpawn { .. }), "got {:?}", err);
    }

    #[test]
    fn test_partial_script_from_failed_conversion_is_removed() {
        let root = TempDir::new().unwrap();
        let nb = notebook(root.path(), "partial.ipynb", "exit 0");
        let converter = CommandConverter::new("sh")
            .arg("-c")
            .arg(r#"echo '# truncated' > "${1%.ipynb}.py"; exit 2"#)
            .arg("sh");

        let err = NotebookRunner::new(converter, ProcessExecutor).run(&nb).unwrap_err();

        assert!(matches!(err, NotebookError::ConversionFailed { code: Some(2), .. }));
        assert!(!root.path().join("partial.py").exists());
    }

    #[test]
    fn test_existing_file_at_script_path_survives_absent_converter() {
        let root = TempDir::new().unwrap();
        let nb = notebook(root.path(), "analysis.ipynb", "exit 0");
        let helper = root.path().join("analysis.py");
        fs::write(&helper, "# hand-written helper module\n").unwrap();
        let runner = NotebookRunner::new(CommandConverter::new("nbtest-no-such-converter-12345"), ProcessExecutor);

        let err = runner.run(&nb).unwrap_err();

        assert!(matches!(err, NotebookError::ScriptPathOccupied { .. }), "got {:?}", err);
        assert_eq!(fs::read_to_string(&helper).unwrap(), "# hand-written helper module\n");
    }

    #[test]
    fn test_leftover_script_is_not_run_when_converter_writes_nothing() {
        let root = TempDir::new().unwrap();
        let nb = notebook(root.path(), "a.ipynb", "exit 1");
        let leftover = root.path().join("a.py");
        fs::write(&leftover, "#!/bin/sh\nexit 0\n").unwrap();
        let runner = NotebookRunner::new(CommandConverter::new("true"), ProcessExecutor);

        let err = runner.run(&nb).unwrap_err();

        match err {
            NotebookError::ScriptPathOccupied { script, notebook } => {
                assert_eq!(script, leftover);
                assert_eq!(notebook, nb);
            }
            other => panic!("expected ScriptPathOccupied, got {:?}", other),
        }
        assert!(leftover.exists());
    }

    #[test]
    fn test_run_notebook_as_test_on_missing_notebook_is_conversion_failure() {
        let root = TempDir::new().unwrap();
        let nb = root.path().join("absent.ipynb");

        // Holds whether jupyter is installed (ConversionFailed/ScriptMissing) or not (ConverterSpawn).
        let err = run_notebook_as_test(&nb).unwrap_err();

        assert!(err.is_conversion_failure(), "got {:?}", err);
        assert!(!root.path().join("absent.py").exists());
    }

    #[test]
    fn test_converter_success_without_script_is_reported() {
        let root = TempDir::new().unwrap();
        let nb = notebook(root.path(), "a.ipynb", "exit 0");
        let converter = CommandConverter::new("true");

        let err = NotebookRunner::new(converter, ProcessExecutor).run(&nb).unwrap_err();

        match err {
            NotebookError::ScriptMissing { script, .. } => assert!(script.ends_with("a.py")),
            other => panic!("expected ScriptMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_notebook_path() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("nested");
        fs::create_dir(&dir).unwrap();
        notebook(&dir, "rel.ipynb", "exit 0");

        let rel = pathdiff(&dir.join("rel.ipynb"));
        let result = fake_runner().run(&rel);

        assert!(result.is_ok(), "got {:?}", result.err());
        assert!(!dir.join("rel.py").exists());
    }

    /// Express `target` relative to the current directory via `..` hops.
    fn pathdiff(target: &Path) -> PathBuf {
        let cwd = env::current_dir().unwrap();
        let mut rel = PathBuf::new();
        for _ in cwd.components().skip(1) {
            rel.push("..");
        }
        rel.join(target.strip_prefix("/").unwrap())
    }

    struct RecordingExecutor {
        calls: Cell<usize>,
        workdir: std::cell::RefCell<Option<PathBuf>>,
    }

    impl ScriptExecutor for RecordingExecutor {
        fn execute(&self, script: &Path, workdir: &Path) -> Result<Output, NotebookError> {
            self.calls.set(self.calls.get() + 1);
            *self.workdir.borrow_mut() = Some(workdir.to_path_buf());
            assert!(script.is_absolute());
            ProcessExecutor.execute(script, workdir)
        }
    }

    #[test]
    fn test_executor_receives_absolute_script_and_notebook_dir() {
        let root = TempDir::new().unwrap();
        let nb = notebook(root.path(), "a.ipynb", "exit 0");
        let executor = RecordingExecutor {
            calls: Cell::new(0),
            workdir: Default::default(),
        };
        let runner = NotebookRunner::new(CommandConverter::new("sh").arg(FAKE_NBCONVERT), executor);

        runner.run(&nb).unwrap();

        assert_eq!(runner.executor().calls.get(), 1);
        assert_eq!(runner.executor().workdir.borrow().as_deref(), Some(root.path()));
    }

    #[test]
    fn test_concurrent_runs_do_not_interfere() {
        let root = TempDir::new().unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let dir = root.path().join(format!("nb{i}"));
                fs::create_dir(&dir).unwrap();
                fs::write(dir.join("marker"), "").unwrap();
                let nb = notebook(&dir, "n.ipynb", "test -f marker");
                std::thread::spawn(move || fake_runner().run(&nb).map(|_| ()))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    }
}
