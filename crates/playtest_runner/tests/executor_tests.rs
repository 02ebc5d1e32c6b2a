//! Integration tests for the test executor layer.
//!
//! These tests drive the executors through the public trait, using the mock
//! executor and small shell harnesses instead of a real LLM engine.

use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use playtest_runner::{
    ExecutionResponse, FsContentResolver, FunctionHandle, MockExecutor, MockResponse,
    ProcessExecutor, ProcessExecutorOptions, RawStatus, RunnerError, RuntimeHandle, TestExecutor,
};

fn handles() -> (RuntimeHandle, FunctionHandle) {
    (RuntimeHandle::new("local"), FunctionHandle::new("ClassifyTicket"))
}

/// The mock executor records which runtime and function each test ran with.
#[tokio::test]
async fn test_mock_executor_captures_handles() {
    let executor = MockExecutor::new();
    let dir = TempDir::new().unwrap();
    let resolver = FsContentResolver::new(dir.path());
    let (runtime, function) = handles();

    for name in ["test_refund", "test_outage"] {
        executor
            .run_test(&runtime, &function, name, &|_: ExecutionResponse| {}, &resolver)
            .await
            .unwrap();
    }

    let calls = executor.get_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].test_name, "test_refund");
    assert_eq!(calls[1].runtime, runtime);
    assert_eq!(calls[1].function, function);
}

/// Content requested by a scripted test is read through the resolver.
#[tokio::test]
async fn test_mock_executor_reads_content() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ticket.txt"), "refund please").unwrap();
    let resolver = FsContentResolver::new(dir.path());
    let executor = MockExecutor::new()
        .respond("test_refund", MockResponse::passed().reading("ticket.txt"));
    let (runtime, function) = handles();

    let result = executor
        .run_test(&runtime, &function, "test_refund", &|_: ExecutionResponse| {}, &resolver)
        .await
        .unwrap();

    assert_eq!(result.status, RawStatus::Passed);
}

/// A process harness can report every known status code.
#[cfg(unix)]
#[tokio::test]
async fn test_process_executor_reports_status_codes() {
    let dir = TempDir::new().unwrap();
    let resolver = FsContentResolver::new(dir.path());
    let (runtime, function) = handles();
    let executor = ProcessExecutor::new(
        ProcessExecutorOptions::new("sh")
            .arg("-c")
            .arg(r#"echo "{\"kind\":\"result\",\"status\":$STATUS}""#)
            .arg("sh"),
    );

    for status in RawStatus::KNOWN {
        let executor = ProcessExecutor::new(
            executor
                .options()
                .clone()
                .env("STATUS", status.code().to_string()),
        );
        let result = executor
            .run_test(&runtime, &function, "t", &|_: ExecutionResponse| {}, &resolver)
            .await
            .unwrap();
        assert_eq!(result.status, status);
    }
}

/// Intermediate responses arrive in the order the harness printed them.
#[cfg(unix)]
#[tokio::test]
async fn test_process_executor_partial_order() {
    let dir = TempDir::new().unwrap();
    let resolver = FsContentResolver::new(dir.path());
    let (runtime, function) = handles();
    let executor = ProcessExecutor::new(
        ProcessExecutorOptions::new("sh").arg("-c").arg(
            r#"for word in a ab abc; do
  echo "{\"kind\":\"partial\",\"llm_response\":\"$word\"}"
done
echo '{"kind":"result","status":3,"failure_reason":"max tokens"}'"#,
        ),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let seen = seen.clone();
        move |r: ExecutionResponse| seen.lock().push(r.llm_response.unwrap_or_default())
    };

    let result = executor
        .run_test(&runtime, &function, "t", &sink, &resolver)
        .await
        .unwrap();

    assert_eq!(result.status, RawStatus::FinishReasonFailed);
    assert_eq!(result.failure_reason.as_deref(), Some("max tokens"));
    assert_eq!(*seen.lock(), vec!["a", "ab", "abc"]);
}

/// A harness that crashes without a result is an execution error.
#[cfg(unix)]
#[tokio::test]
async fn test_process_executor_crash() {
    let dir = TempDir::new().unwrap();
    let resolver = FsContentResolver::new(dir.path());
    let (runtime, function) = handles();
    let executor = ProcessExecutor::new(
        ProcessExecutorOptions::new("sh")
            .arg("-c")
            .arg("echo 'traceback: boom' >&2; exit 1"),
    );

    let result = executor
        .run_test(&runtime, &function, "t", &|_: ExecutionResponse| {}, &resolver)
        .await;

    match result {
        Err(RunnerError::NoResult { code, stderr }) => {
            assert_eq!(code, Some(1));
            assert!(stderr.contains("boom"));
        }
        other => panic!("Expected NoResult error, got {:?}", other),
    }
}
