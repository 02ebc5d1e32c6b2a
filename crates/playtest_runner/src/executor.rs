//! Test executor trait and the capabilities handed to it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;
use crate::result::{ExecutionResponse, ExecutionResult};

/// Handle to the runtime currently selected by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeHandle {
    pub id: String,
}

impl RuntimeHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Handle to the function whose tests are being run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionHandle {
    pub name: String,
}

impl FunctionHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for FunctionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Receives intermediate responses while a test is running.
///
/// May be called zero or more times, always before the test settles.
pub trait ProgressSink: Send + Sync {
    fn on_intermediate(&self, response: ExecutionResponse);
}

impl<F> ProgressSink for F
where
    F: Fn(ExecutionResponse) + Send + Sync,
{
    fn on_intermediate(&self, response: ExecutionResponse) {
        self(response)
    }
}

/// Resolves content referenced by a test (images, audio, documents) by path.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn resolve(&self, path: &str) -> RunnerResult<Vec<u8>>;
}

/// Executes a single named test.
///
/// Every invocation must settle, either with a result or with an error.
#[async_trait]
pub trait TestExecutor: Send + Sync {
    async fn run_test(
        &self,
        runtime: &RuntimeHandle,
        function: &FunctionHandle,
        test_name: &str,
        progress: &dyn ProgressSink,
        resolver: &dyn ContentResolver,
    ) -> RunnerResult<ExecutionResult>;
}
