//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
///
/// None of these escape a run: per-test problems are captured in the test's
/// state, and precondition failures surface as a rejected run.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Test not tracked in the current run: {0}")]
    UnknownTest(String),

    #[error("Invalid state transition for {test}: {from} -> {to}")]
    InvalidTransition {
        test: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Code potentially modified while running tests")]
    SelectionChanged,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
