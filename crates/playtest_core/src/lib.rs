//! # playtest_core
//!
//! Test-run orchestrator for playtest.
//!
//! This crate runs a set of named tests against an executor capability,
//! tracks every test through its lifecycle, keeps live aggregate counters and
//! folds each outcome into a single suite verdict.
//!
//! # Architecture
//!
//! - **Classifier**: maps raw statuses to an outcome category and a verdict
//! - **Summary**: the `unknown < pass < warn < fail` suite verdict and its merge rule
//! - **State tracker**: one `Queued -> Running -> Done | Failed` machine per test
//! - **Counts**: queued/running/done/error totals, updated with each transition
//! - **Controller**: the single-run guard, batching, and executor invocation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use playtest_core::{OrchestratorConfig, RunController, StaticSelection};
//! use playtest_runner::{FsContentResolver, FunctionHandle, MockExecutor, RuntimeHandle};
//!
//! let selection = Arc::new(StaticSelection::selected(
//!     RuntimeHandle::new("local"),
//!     FunctionHandle::new("ExtractResume"),
//! ));
//! let controller = RunController::new(
//!     Arc::new(MockExecutor::new()),
//!     selection,
//!     Arc::new(FsContentResolver::new(".")),
//! )
//! .with_config(OrchestratorConfig::new().batch_size(2)?);
//!
//! let outcome = controller.start_run(["test_one", "test_two"]).await;
//! if let Some(report) = outcome.report() {
//!     println!("Suite verdict: {}", report.summary);
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod controller;
pub mod counts;
pub mod error;
pub mod events;
pub mod selection;
pub mod state;
pub mod summary;
pub mod telemetry;

// Re-export main types for convenience
pub use classifier::{categorize, classify, Classification, OutcomeCategory, EXECUTION_FAILURE_VERDICT};
pub use config::OrchestratorConfig;
pub use controller::{RejectReason, RunController, RunOutcome, RunReport, TestRecord};
pub use counts::{AggregateCounts, DoneCounts};
pub use error::{CoreError, CoreResult};
pub use events::RunEvent;
pub use selection::{SelectionProvider, StaticSelection};
pub use state::{StateTracker, TestState};
pub use summary::{resolve, SuiteSummary};
pub use telemetry::{NoopTelemetry, TelemetryEvent, TelemetrySink, TracingTelemetry};
