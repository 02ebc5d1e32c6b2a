//! Run controller.
//!
//! Owns the single-run guard and all shared run state, splits a run into
//! sequential batches, executes each batch concurrently and applies every
//! per-test transition together with its counter update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use playtest_runner::{
    ContentResolver, ExecutionResponse, ExecutionResult, FunctionHandle, RuntimeHandle,
    TestExecutor,
};

use crate::classifier::{classify, Classification, EXECUTION_FAILURE_VERDICT};
use crate::config::OrchestratorConfig;
use crate::counts::AggregateCounts;
use crate::error::CoreError;
use crate::events::RunEvent;
use crate::selection::SelectionProvider;
use crate::state::{StateTracker, TestState};
use crate::summary::SuiteSummary;
use crate::telemetry::{NoopTelemetry, TelemetryEvent, TelemetrySink};

/// Why a run was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NoRuntimeSelected,
    NoFunctionSelected,
    AlreadyRunning,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRuntimeSelected => write!(f, "no runtime selected"),
            Self::NoFunctionSelected => write!(f, "no function selected"),
            Self::AlreadyRunning => write!(f, "a run is already in progress"),
        }
    }
}

/// Final state of one test in a run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub name: String,
    #[serde(flatten)]
    pub state: TestState,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tests: Vec<TestRecord>,
    pub counts: AggregateCounts,
    pub summary: SuiteSummary,
}

impl RunReport {
    pub fn test(&self, name: &str) -> Option<&TestState> {
        self.tests.iter().find(|t| t.name == name).map(|t| &t.state)
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Result of [`RunController::start_run`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run executed to completion.
    Completed(RunReport),
    /// A precondition failed; nothing was changed.
    Rejected(RejectReason),
}

impl RunOutcome {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// State shared by every test of the current run.
#[derive(Debug, Default)]
struct RunState {
    tracker: StateTracker,
    counts: AggregateCounts,
    summary: SuiteSummary,
    running_tests: Vec<String>,
    tests_visible: bool,
}

/// Holds the run guard; releases it on drop, including on panic.
struct RunLease<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunLease<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunLease<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Orchestrates test runs against an executor.
///
/// At most one run is active at a time; a second `start_run` while one is in
/// progress is rejected without touching any state.
pub struct RunController {
    executor: Arc<dyn TestExecutor>,
    resolver: Arc<dyn ContentResolver>,
    selection: Arc<dyn SelectionProvider>,
    telemetry: Arc<dyn TelemetrySink>,
    config: OrchestratorConfig,
    running: AtomicBool,
    state: Mutex<RunState>,
    events: broadcast::Sender<RunEvent>,
}

impl RunController {
    /// Create a controller with the default configuration and no telemetry.
    pub fn new(
        executor: Arc<dyn TestExecutor>,
        selection: Arc<dyn SelectionProvider>,
        resolver: Arc<dyn ContentResolver>,
    ) -> Self {
        let config = OrchestratorConfig::default();
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            executor,
            resolver,
            selection,
            telemetry: Arc::new(NoopTelemetry),
            config,
            running: AtomicBool::new(false),
            state: Mutex::new(RunState::default()),
            events,
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        self.events = events;
        self.config = config;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Subscribe to run events.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn summary(&self) -> SuiteSummary {
        self.state.lock().summary
    }

    pub fn counts(&self) -> AggregateCounts {
        self.state.lock().counts.clone()
    }

    pub fn state(&self, test_name: &str) -> Option<TestState> {
        self.state.lock().tracker.get(test_name).cloned()
    }

    /// Every tracked test with its state, in run order.
    pub fn states(&self) -> Vec<(String, TestState)> {
        self.state.lock().tracker.snapshot()
    }

    /// Names of the tests in the current (or most recent) run.
    pub fn running_tests(&self) -> Vec<String> {
        self.state.lock().running_tests.clone()
    }

    /// Whether the host should be showing the test panel.
    pub fn tests_visible(&self) -> bool {
        self.state.lock().tests_visible
    }

    fn emit(&self, event: RunEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Run the given tests.
    ///
    /// Returns [`RunOutcome::Rejected`] without side effects when no runtime
    /// or function is selected, or when a run is already in progress.
    /// Otherwise runs every test to settlement, batch by batch, and returns
    /// the final report. Duplicate names are run once.
    #[instrument(skip_all)]
    pub async fn start_run<I, S>(&self, test_names: I) -> RunOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(runtime) = self.selection.runtime() else {
            debug!("Refusing to run tests: no runtime selected");
            return RunOutcome::Rejected(RejectReason::NoRuntimeSelected);
        };
        let Some(function) = self.selection.function() else {
            debug!("Refusing to run tests: no function selected");
            return RunOutcome::Rejected(RejectReason::NoFunctionSelected);
        };
        let Some(_lease) = RunLease::acquire(&self.running) else {
            debug!("Refusing to run tests: a run is already in progress");
            return RunOutcome::Rejected(RejectReason::AlreadyRunning);
        };

        let requested: Vec<String> = test_names.into_iter().map(Into::into).collect();
        let num_requested = requested.len();
        let tests = distinct(requested);
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.state.lock().tests_visible = true;
        self.emit(RunEvent::RunStarted {
            run_id,
            tests: tests.clone(),
        });

        self.state.lock().summary = SuiteSummary::Unknown;

        let telemetry = TelemetryEvent::RunTests {
            num_tests: num_requested,
        };
        if let Err(e) = self.telemetry.record(&telemetry) {
            debug!("Ignoring telemetry failure: {}", e);
        }

        {
            let mut state = self.state.lock();
            state.tracker.purge_all();
            state.tracker.end_purge();
            state.tracker.enqueue(&tests);
            state.running_tests = tests.clone();
            state.counts = AggregateCounts::new(tests.len());
        }

        let batch_size = self.config.batch_size.get();
        info!(
            %run_id,
            function = %function,
            runtime = %runtime,
            tests = tests.len(),
            batch_size,
            "Starting test run"
        );

        for (index, batch) in tests.chunks(batch_size).enumerate() {
            debug!(batch = index, size = batch.len(), "Running batch");
            join_all(
                batch
                    .iter()
                    .map(|name| self.run_test(&runtime, &function, name)),
            )
            .await;
        }

        let report = {
            let state = self.state.lock();
            RunReport {
                run_id,
                started_at,
                finished_at: Utc::now(),
                tests: state
                    .tracker
                    .snapshot()
                    .into_iter()
                    .map(|(name, state)| TestRecord { name, state })
                    .collect(),
                counts: state.counts.clone(),
                summary: state.summary,
            }
        };

        info!(
            %run_id,
            summary = %report.summary,
            passed = report.counts.done.passed,
            errors = report.counts.error,
            duration_ms = report.duration_ms(),
            "Test run finished"
        );
        self.emit(RunEvent::RunFinished {
            run_id,
            counts: report.counts.clone(),
            summary: report.summary,
        });

        RunOutcome::Completed(report)
    }

    /// Execute one test and record its outcome. Never fails the batch.
    async fn run_test(&self, runtime: &RuntimeHandle, function: &FunctionHandle, name: &str) {
        {
            let mut state = self.state.lock();
            if let Err(e) = state.tracker.start(name) {
                warn!("Skipping test: {}", e);
                return;
            }
            state.counts.start_one();
        }
        self.emit(RunEvent::TestStarted {
            test: name.to_string(),
        });

        let progress = |response: ExecutionResponse| self.record_progress(name, response);
        let started = Instant::now();
        let outcome = if self.selection_lost() {
            Err(CoreError::SelectionChanged.to_string())
        } else {
            self.executor
                .run_test(runtime, function, name, &progress, self.resolver.as_ref())
                .await
                .map_err(|e| e.to_string())
        };
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.settle(name, outcome, latency_ms);
    }

    fn selection_lost(&self) -> bool {
        self.selection.runtime().is_none() || self.selection.function().is_none()
    }

    fn record_progress(&self, name: &str, response: ExecutionResponse) {
        let recorded = self
            .state
            .lock()
            .tracker
            .record_intermediate(name, response.clone());
        match recorded {
            Ok(()) => self.emit(RunEvent::TestProgress {
                test: name.to_string(),
                response,
            }),
            Err(e) => warn!("Dropping intermediate response: {}", e),
        }
    }

    /// Apply the terminal transition, counter update and summary merge as one
    /// step.
    fn settle(&self, name: &str, outcome: Result<ExecutionResult, String>, latency_ms: u64) {
        let mut state = self.state.lock();
        let RunState {
            tracker,
            counts,
            summary,
            ..
        } = &mut *state;

        let verdict = match outcome {
            Ok(result) => {
                let Classification { category, verdict } = classify(result.status);
                debug!(test = name, status = %result.status, %category, latency_ms, "Test done");
                if let Err(e) = tracker.complete(name, category, result, latency_ms) {
                    warn!("Discarding result: {}", e);
                    return;
                }
                counts.finish_done(category);
                verdict
            }
            Err(message) => {
                debug!(test = name, latency_ms, "Test failed: {}", message);
                if let Err(e) = tracker.fail(name, message) {
                    warn!("Discarding failure: {}", e);
                    return;
                }
                counts.finish_error();
                EXECUTION_FAILURE_VERDICT
            }
        };
        *summary = summary.merge(verdict);

        let event = RunEvent::TestFinished {
            test: name.to_string(),
            state: tracker.get(name).cloned().unwrap_or(TestState::Queued),
            counts: counts.clone(),
            summary: *summary,
        };
        drop(state);
        self.emit(event);
    }
}

/// Keep the first occurrence of each name, preserving order.
fn distinct<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .map(Into::into)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
