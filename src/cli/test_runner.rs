//! Test session over the notebook catalog (pytest-style)
//!
//! ## TestReporter Trait
//!
//! The session uses a `TestReporter` trait to separate reporting from
//! execution. `ConsoleReporter` prints pytest-style lines; tests use a
//! recording reporter.
//!
//! Notebooks run one at a time in catalog order. Skipped cases are reported
//! without touching the converter or the notebook.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::catalog::{NOTEBOOKS, NotebookCase};
use crate::config::RunnerConfig;
use crate::errors::NotebookError;
use crate::executor::{NotebookRunner, ScriptConverter, ScriptExecutor};

use super::{CliError, CliResult, ExitCode};

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting test execution results.
pub trait TestReporter {
    /// Called once the catalog has been filtered
    fn on_collection_complete(&mut self, test_count: usize);

    /// Called when a notebook run begins
    fn on_test_start(&mut self, _test: &TestInfo) {}

    /// Called when a test completes or is skipped
    fn on_test_complete(&mut self, test: &TestInfo, result: &TestResult);

    /// Called when all tests have completed
    fn on_run_complete(&mut self, summary: &TestSummary);
}

/// Summary of test run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: Duration,
}

impl TestSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// `2 passed, 1 failed, 3 skipped`
    pub fn counts(&self) -> String {
        let mut parts = Vec::new();
        if self.passed > 0 {
            parts.push(format!("{} passed", self.passed));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if parts.is_empty() {
            "no tests ran".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Default console reporter (pytest-style)
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    failures: Vec<(String, PathBuf, String)>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            failures: Vec::new(),
        }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, test_count: usize) {
        println!("\x1b[1m=================== test session starts ===================\x1b[0m");
        println!("collected {} item(s)", test_count);
        println!();
    }

    fn on_test_complete(&mut self, test: &TestInfo, result: &TestResult) {
        let status = match result {
            TestResult::Passed(d) => {
                if self.verbose {
                    format!("\x1b[32mPASSED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[32mPASSED\x1b[0m".to_string()
                }
            }
            TestResult::Failed(d, _) => {
                if self.verbose {
                    format!("\x1b[31mFAILED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[31mFAILED\x1b[0m".to_string()
                }
            }
            TestResult::Skipped(reason) => format!("\x1b[33mSKIPPED\x1b[0m ({})", reason),
        };

        let notebook = test.notebook.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
        println!("{}::{} {}", notebook, test.name, status);

        if let TestResult::Failed(_, error) = result {
            self.failures
                .push((test.name.to_string(), test.notebook.clone(), error.clone()));
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        if !self.failures.is_empty() {
            println!();
            println!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
            for (name, notebook, message) in &self.failures {
                println!();
                println!("\x1b[1m___________ {} ___________\x1b[0m", name);
                println!();
                for line in message.lines() {
                    println!("    {}", line);
                }
                println!();
                println!("    {}::{}", notebook.display(), name);
            }
        }

        let color = if summary.is_success() { "\x1b[1;32m" } else { "\x1b[1;31m" };
        println!();
        println!(
            "{}=================== {} in {:.2}s ===================\x1b[0m",
            color,
            summary.counts(),
            summary.duration.as_secs_f64()
        );
    }
}

/// A catalog case bound to a notebook root.
#[derive(Debug, Clone)]
pub struct TestInfo {
    pub name: &'static str,
    pub notebook: PathBuf,
    pub skip: Option<&'static str>,
}

impl TestInfo {
    pub fn from_case(case: &NotebookCase, root: &Path) -> Self {
        Self {
            name: case.name,
            notebook: case.resolve(root),
            skip: case.skip,
        }
    }
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed(Duration),
    Failed(Duration, String),
    Skipped(String),
}

/// Options for one `nbtest test` session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub root: PathBuf,
    pub verbose: bool,
    pub stop_on_fail: bool,
    pub filter: Option<String>,
}

/// Catalog cases selected by `filter` (substring of the test name).
pub fn collect_tests(cases: &[NotebookCase], root: &Path, filter: Option<&str>) -> Vec<TestInfo> {
    cases
        .iter()
        .filter(|case| filter.is_none_or(|keyword| case.name.contains(keyword)))
        .map(|case| TestInfo::from_case(case, root))
        .collect()
}

/// Run the whole catalog under `options.root`.
pub fn run_tests(config: &RunnerConfig, options: &SessionOptions) -> CliResult<ExitCode> {
    let runner = NotebookRunner::from_config(config);
    let tests = collect_tests(NOTEBOOKS, &options.root, options.filter.as_deref());
    let mut reporter = ConsoleReporter::new(options.verbose);

    if tests.is_empty() {
        eprintln!("No tests collected");
        return Ok(ExitCode::SUCCESS); // "no tests collected" is not a failure
    }

    let summary = run_session(&runner, &tests, options.stop_on_fail, options.verbose, &mut reporter);

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already printed
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

/// Run `tests` sequentially through `runner`, reporting as it goes.
pub fn run_session<C, E, R>(
    runner: &NotebookRunner<C, E>,
    tests: &[TestInfo],
    stop_on_fail: bool,
    verbose: bool,
    reporter: &mut R,
) -> TestSummary
where
    C: ScriptConverter,
    E: ScriptExecutor,
    R: TestReporter + ?Sized,
{
    let start = Instant::now();
    let mut summary = TestSummary::default();

    reporter.on_collection_complete(tests.len());

    for test in tests {
        summary.total += 1;

        if let Some(reason) = test.skip {
            tracing::debug!(test = test.name, reason, "skipping notebook");
            summary.skipped += 1;
            reporter.on_test_complete(test, &TestResult::Skipped(reason.to_string()));
            continue;
        }

        reporter.on_test_start(test);
        let result = run_single_test(runner, test, verbose);
        let failed = matches!(result, TestResult::Failed(..));
        if failed {
            summary.failed += 1;
        } else {
            summary.passed += 1;
        }
        reporter.on_test_complete(test, &result);

        if stop_on_fail && failed {
            break;
        }
    }

    summary.duration = start.elapsed();
    reporter.on_run_complete(&summary);
    summary
}

fn run_single_test<C: ScriptConverter, E: ScriptExecutor>(
    runner: &NotebookRunner<C, E>,
    test: &TestInfo,
    verbose: bool,
) -> TestResult {
    let start = Instant::now();
    match runner.run(&test.notebook) {
        Ok(output) => TestResult::Passed(output.duration),
        Err(e) => {
            tracing::warn!(test = test.name, error = %e, "notebook failed");
            TestResult::Failed(start.elapsed(), failure_message(&e, verbose))
        }
    }
}

/// One-line cause, plus the captured stderr in verbose mode.
fn failure_message(error: &NotebookError, verbose: bool) -> String {
    let stderr = match error {
        NotebookError::ScriptFailed { stderr, .. } | NotebookError::ConversionFailed { stderr, .. } => {
            stderr.as_deref()
        }
        _ => None,
    };
    match stderr {
        Some(stderr) if verbose => format!("{}\n{}", error, stderr),
        Some(stderr) => match stderr.lines().last() {
            Some(last) => format!("{}\n{}", error, last),
            None => error.to_string(),
        },
        None => error.to_string(),
    }
}
