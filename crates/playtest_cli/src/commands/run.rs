//! Run command - Execute a set of tests and report the suite verdict.
//!
//! Tests are executed through a harness program. Transitions are printed as
//! they happen, followed by a table of final states and the verdict.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::info;

use playtest_core::{
    OrchestratorConfig, RunController, RunEvent, RunOutcome, RunReport, StaticSelection,
    SuiteSummary, TestState, TracingTelemetry,
};
use playtest_runner::{
    FsContentResolver, FunctionHandle, ProcessExecutor, ProcessExecutorOptions, RuntimeHandle,
};

use crate::ExitCodes;

#[derive(Args)]
pub struct RunArgs {
    /// Runtime to run the tests against
    #[arg(short, long)]
    runtime: String,

    /// Function under test
    #[arg(short, long)]
    function: String,

    /// Test to run (repeatable)
    #[arg(short, long = "test", value_name = "NAME")]
    tests: Vec<String>,

    /// File listing test names, one per line
    #[arg(long, value_name = "FILE")]
    tests_file: Option<PathBuf>,

    /// Number of tests to run concurrently per batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Orchestrator config file (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory that content referenced by tests is read from
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Print the final report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Harness program and its arguments
    #[arg(last = true, required = true, value_name = "PROGRAM")]
    command: Vec<String>,
}

pub async fn execute(args: RunArgs) -> Result<u8> {
    let tests = collect_tests(&args)?;
    if tests.is_empty() {
        anyhow::bail!("No tests given: pass --test or --tests-file argument");
    }
    let config = load_config(&args)?;
    let options = harness_options(&args.command)?;

    info!(
        "Running {} tests for {} on {}",
        tests.len(),
        args.function,
        args.runtime
    );

    let selection = Arc::new(StaticSelection::selected(
        RuntimeHandle::new(&args.runtime),
        FunctionHandle::new(&args.function),
    ));
    let controller = RunController::new(
        Arc::new(ProcessExecutor::new(options)),
        selection,
        Arc::new(FsContentResolver::new(&args.root)),
    )
    .with_config(config)
    .with_telemetry(Arc::new(TracingTelemetry));

    let printer = (!args.json).then(|| tokio::spawn(print_events(controller.subscribe())));

    let outcome = controller.start_run(tests).await;
    // Closes the event channel so the printer drains and exits.
    drop(controller);
    if let Some(printer) = printer {
        printer.await.context("Event printer panicked")?;
    }

    let report = match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::Rejected(reason) => anyhow::bail!("Run rejected: {}", reason),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(exit_code_for(report.summary))
}

fn exit_code_for(summary: SuiteSummary) -> u8 {
    match summary {
        SuiteSummary::Fail => ExitCodes::SUITE_FAILURE,
        SuiteSummary::Unknown | SuiteSummary::Pass | SuiteSummary::Warn => ExitCodes::SUCCESS,
    }
}

/// Names from `--test` followed by names from `--tests-file`.
fn collect_tests(args: &RunArgs) -> Result<Vec<String>> {
    let mut tests = args.tests.clone();
    if let Some(path) = &args.tests_file {
        tests.extend(read_tests_file(path)?);
    }
    Ok(tests)
}

/// One name per line. Blank lines and `#` comments are skipped.
fn read_tests_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Tests file not found: {:?}", path))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn load_config(args: &RunArgs) -> Result<OrchestratorConfig> {
    let mut config = match &args.config {
        Some(path) => OrchestratorConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => OrchestratorConfig::new(),
    };
    if let Some(size) = args.batch_size {
        config = config
            .batch_size(size)
            .context("Invalid --batch-size argument")?;
    }
    Ok(config)
}

fn harness_options(command: &[String]) -> Result<ProcessExecutorOptions> {
    let (program, rest) = command
        .split_first()
        .context("Missing harness program argument")?;
    Ok(ProcessExecutorOptions::new(program).args(rest.to_vec()))
}

async fn print_events(mut events: Receiver<RunEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => print_event(&event),
            Err(RecvError::Lagged(skipped)) => eprintln!("  ... {} events skipped", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &RunEvent) {
    match event {
        RunEvent::RunStarted { tests, .. } => println!("▶ Running {} tests", tests.len()),
        RunEvent::TestStarted { test } => println!("  … {}", test),
        RunEvent::TestProgress { .. } => {}
        RunEvent::TestFinished {
            test,
            state,
            summary,
            ..
        } => match state {
            TestState::Done {
                category,
                latency_ms,
                ..
            } => println!("  ✓ {} {} ({} ms) [suite: {}]", test, category, latency_ms, summary),
            TestState::Failed { message } => {
                println!("  ✗ {} error: {} [suite: {}]", test, message, summary)
            }
            other => println!("  ? {} {}", test, other.label()),
        },
        RunEvent::RunFinished { .. } => {}
    }
}

fn print_report(report: &RunReport) {
    let width = report
        .tests
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!();
    println!("{:<width$}  {:<8}  {:<22}  {:>8}", "TEST", "STATE", "OUTCOME", "LATENCY");
    for record in &report.tests {
        let (outcome, latency) = match &record.state {
            TestState::Done {
                category,
                latency_ms,
                ..
            } => (category.to_string(), format!("{} ms", latency_ms)),
            TestState::Failed { message } => (message.clone(), String::new()),
            _ => (String::new(), String::new()),
        };
        println!(
            "{:<width$}  {:<8}  {:<22}  {:>8}",
            record.name,
            record.state.label(),
            outcome,
            latency
        );
    }

    let counts = &report.counts;
    println!();
    println!("Summary:");
    println!(
        "  Done:      {} (passed {}, llm failed {}, finish reason failed {}, parse failed {}, constraints failed {}, error {})",
        counts.done.total(),
        counts.done.passed,
        counts.done.llm_failed,
        counts.done.finish_reason_failed,
        counts.done.parse_failed,
        counts.done.constraints_failed,
        counts.done.error
    );
    println!("  Errors:    {}", counts.error);
    println!("  Duration:  {} ms", report.duration_ms());

    println!();
    match report.summary {
        SuiteSummary::Pass => println!("✅ Suite PASSED"),
        SuiteSummary::Warn => println!("⚠️  Suite passed with WARNINGS"),
        SuiteSummary::Fail => println!("❌ Suite FAILED"),
        SuiteSummary::Unknown => println!("❔ Suite verdict UNKNOWN"),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::TempDir;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(argv: &[&str]) -> RunArgs {
        Harness::parse_from(std::iter::once("run").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_parses_harness_command() {
        let args = parse(&["-r", "local", "-f", "Extract", "-t", "a", "-t", "b", "--", "python", "harness.py"]);
        assert_eq!(args.tests, vec!["a", "b"]);
        let options = harness_options(&args.command).unwrap();
        assert_eq!(options.program, "python");
        assert_eq!(options.args, vec!["harness.py"]);
    }

    #[test]
    fn test_harness_is_required() {
        let result = Harness::try_parse_from(["run", "-r", "local", "-f", "Extract", "-t", "a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tests_file_skips_blanks_and_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tests.txt");
        std::fs::write(&path, "# smoke\ntest_one\n\n  test_two  \n").unwrap();

        let args = parse(&[
            "-r",
            "local",
            "-f",
            "Extract",
            "-t",
            "test_zero",
            "--tests-file",
            path.to_str().unwrap(),
            "--",
            "harness",
        ]);
        assert_eq!(
            collect_tests(&args).unwrap(),
            vec!["test_zero", "test_one", "test_two"]
        );
    }

    #[test]
    fn test_batch_size_flag_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playtest.yaml");
        std::fs::write(&path, "batch_size: 4\n").unwrap();

        let args = parse(&["-r", "l", "-f", "F", "-c", path.to_str().unwrap(), "--", "h"]);
        assert_eq!(load_config(&args).unwrap().batch_size.get(), 4);

        let args = parse(&["-r", "l", "-f", "F", "-c", path.to_str().unwrap(), "-b", "2", "--", "h"]);
        assert_eq!(load_config(&args).unwrap().batch_size.get(), 2);

        let args = parse(&["-r", "l", "-f", "F", "-b", "0", "--", "h"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_only_fail_is_a_failing_exit_code() {
        assert_eq!(exit_code_for(SuiteSummary::Fail), ExitCodes::SUITE_FAILURE);
        assert_eq!(exit_code_for(SuiteSummary::Warn), ExitCodes::SUCCESS);
        assert_eq!(exit_code_for(SuiteSummary::Unknown), ExitCodes::SUCCESS);
    }
}
