//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while executing a test.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Test execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Test process exited with code {code:?} without reporting a result: {stderr}")]
    NoResult { code: Option<i32>, stderr: String },

    #[error("Failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Content not found: {0}")]
    ContentNotFound(String),

    #[error("Invalid content path: {0}")]
    InvalidPath(String),

    #[error("Invalid executor output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
