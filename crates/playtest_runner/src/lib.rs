//! # playtest_runner
//!
//! Test executor capability for playtest.
//!
//! This crate defines the contract between the run orchestrator and whatever
//! engine actually executes a test, together with a few ready-made
//! implementations.
//!
//! # Features
//!
//! - **Executor trait**: `TestExecutor`, driven once per test name
//! - **Progress streaming**: intermediate responses via `ProgressSink`
//! - **Content resolution**: `ContentResolver`, with a filesystem implementation
//! - **Process executor**: runs a harness program speaking line-delimited JSON
//! - **Mock executor**: scripted responses for testing without an engine
//!
//! # Example
//!
//! ```rust,no_run
//! use playtest_runner::{
//!     ExecutionResponse, FsContentResolver, FunctionHandle, ProcessExecutor,
//!     ProcessExecutorOptions, RuntimeHandle, TestExecutor,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = ProcessExecutor::new(
//!         ProcessExecutorOptions::new("python").arg("-m").arg("harness"),
//!     );
//!     let resolver = FsContentResolver::new(".");
//!
//!     let result = executor
//!         .run_test(
//!             &RuntimeHandle::new("local"),
//!             &FunctionHandle::new("ExtractResume"),
//!             "test_simple_resume",
//!             &|partial: ExecutionResponse| println!("partial: {:?}", partial.llm_response),
//!             &resolver,
//!         )
//!         .await?;
//!     println!("Status: {}", result.status);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod mock;
pub mod process;
pub mod resolver;
pub mod result;

pub use config::{ProcessExecutorOptions, FUNCTION_ENV, RUNTIME_ENV};
pub use error::{RunnerError, RunnerResult};
pub use executor::{ContentResolver, FunctionHandle, ProgressSink, RuntimeHandle, TestExecutor};
pub use mock::{CapturedCall, MockExecutor, MockResponse};
pub use process::ProcessExecutor;
pub use resolver::FsContentResolver;
pub use result::{CheckResult, ExecutionResponse, ExecutionResult, RawStatus};
