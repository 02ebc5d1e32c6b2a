//! Mock test executor for testing.
//!
//! Provides a scriptable implementation of the TestExecutor trait for use in
//! unit tests without running a real execution engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{RunnerError, RunnerResult};
use crate::executor::{ContentResolver, FunctionHandle, ProgressSink, RuntimeHandle, TestExecutor};
use crate::result::{ExecutionResponse, ExecutionResult, RawStatus};

/// Scripted behavior for one test.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: RawStatus,
    pub intermediate: Vec<ExecutionResponse>,
    pub content_paths: Vec<String>,
    pub delay_ms: u64,
    pub failure: Option<String>,
}

impl MockResponse {
    pub fn status(status: RawStatus) -> Self {
        Self {
            status,
            intermediate: Vec::new(),
            content_paths: Vec::new(),
            delay_ms: 0,
            failure: None,
        }
    }

    pub fn passed() -> Self {
        Self::status(RawStatus::Passed)
    }

    /// Make the executor reject this test with the given message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::passed()
        }
    }

    pub fn with_intermediate(mut self, response: ExecutionResponse) -> Self {
        self.intermediate.push(response);
        self
    }

    /// Resolve this path through the content resolver before settling.
    pub fn reading(mut self, path: impl Into<String>) -> Self {
        self.content_paths.push(path.into());
        self
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub test_name: String,
    pub runtime: RuntimeHandle,
    pub function: FunctionHandle,
}

/// Mock test executor for testing.
///
/// This executor captures all calls and plays back scripted responses keyed
/// by test name. It also tracks how many tests were in flight at once so
/// tests can verify batching.
#[derive(Clone)]
pub struct MockExecutor {
    /// Scripted responses by test name.
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    /// Response for tests with no scripted entry.
    default_response: Arc<RwLock<MockResponse>>,
    /// Captured calls, in invocation order.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Test names, in settlement order.
    settled: Arc<RwLock<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    /// Create a new mock executor that passes every test.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            default_response: Arc::new(RwLock::new(MockResponse::passed())),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            settled: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script the response for a test.
    pub fn respond(self, test_name: impl Into<String>, response: MockResponse) -> Self {
        self.responses.write().insert(test_name.into(), response);
        self
    }

    /// Set the response used for unscripted tests.
    pub fn default_response(self, response: MockResponse) -> Self {
        *self.default_response.write() = response;
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific test was executed.
    pub fn was_called(&self, test_name: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.test_name == test_name)
    }

    /// Test names in the order they settled.
    pub fn settled_order(&self) -> Vec<String> {
        self.settled.read().clone()
    }

    /// Highest number of tests that were executing at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn response_for(&self, test_name: &str) -> MockResponse {
        self.responses
            .read()
            .get(test_name)
            .cloned()
            .unwrap_or_else(|| self.default_response.read().clone())
    }

    async fn play(
        &self,
        response: MockResponse,
        progress: &dyn ProgressSink,
        resolver: &dyn ContentResolver,
    ) -> RunnerResult<ExecutionResult> {
        for partial in response.intermediate {
            progress.on_intermediate(partial);
        }
        for path in &response.content_paths {
            resolver.resolve(path).await?;
        }
        if response.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(response.delay_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
        if let Some(message) = response.failure {
            return Err(RunnerError::ExecutionFailed(message));
        }
        Ok(ExecutionResult::new(response.status))
    }
}

#[async_trait]
impl TestExecutor for MockExecutor {
    async fn run_test(
        &self,
        runtime: &RuntimeHandle,
        function: &FunctionHandle,
        test_name: &str,
        progress: &dyn ProgressSink,
        resolver: &dyn ContentResolver,
    ) -> RunnerResult<ExecutionResult> {
        self.captured_calls.write().push(CapturedCall {
            test_name: test_name.to_string(),
            runtime: runtime.clone(),
            function: function.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let response = self.response_for(test_name);
        let result = self.play(response, progress, resolver).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.settled.write().push(test_name.to_string());
        result
    }
}
