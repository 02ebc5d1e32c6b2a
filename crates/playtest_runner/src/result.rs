//! Raw results produced by a test executor.

use serde::{Deserialize, Serialize};

/// Raw status code reported by the execution engine for a finished test.
///
/// The engine reports a bare integer. Known codes map to the named variants in
/// declaration order; anything else is kept as [`RawStatus::Unrecognized`] so
/// that it can be classified defensively instead of rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum RawStatus {
    Passed,
    LlmFailure,
    ParseFailure,
    FinishReasonFailed,
    ConstraintsFailed,
    AssertFailed,
    UnableToRun,
    Unrecognized(u32),
}

impl RawStatus {
    /// All known statuses, in code order.
    pub const KNOWN: [RawStatus; 7] = [
        RawStatus::Passed,
        RawStatus::LlmFailure,
        RawStatus::ParseFailure,
        RawStatus::FinishReasonFailed,
        RawStatus::ConstraintsFailed,
        RawStatus::AssertFailed,
        RawStatus::UnableToRun,
    ];

    /// Get the integer code for this status.
    pub fn code(&self) -> u32 {
        match self {
            Self::Passed => 0,
            Self::LlmFailure => 1,
            Self::ParseFailure => 2,
            Self::FinishReasonFailed => 3,
            Self::ConstraintsFailed => 4,
            Self::AssertFailed => 5,
            Self::UnableToRun => 6,
            Self::Unrecognized(code) => *code,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<u32> for RawStatus {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Passed,
            1 => Self::LlmFailure,
            2 => Self::ParseFailure,
            3 => Self::FinishReasonFailed,
            4 => Self::ConstraintsFailed,
            5 => Self::AssertFailed,
            6 => Self::UnableToRun,
            other => Self::Unrecognized(other),
        }
    }
}

impl From<RawStatus> for u32 {
    fn from(status: RawStatus) -> Self {
        status.code()
    }
}

impl std::fmt::Display for RawStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "Passed"),
            Self::LlmFailure => write!(f, "LLMFailure"),
            Self::ParseFailure => write!(f, "ParseFailure"),
            Self::FinishReasonFailed => write!(f, "FinishReasonFailed"),
            Self::ConstraintsFailed => write!(f, "ConstraintsFailed"),
            Self::AssertFailed => write!(f, "AssertFailed"),
            Self::UnableToRun => write!(f, "UnableToRun"),
            Self::Unrecognized(code) => write!(f, "Unrecognized({})", code),
        }
    }
}

/// Partial output streamed by the executor while a test is still running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    /// Raw LLM text received so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_response: Option<String>,
    /// Best-effort parse of the text received so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<serde_json::Value>,
}

impl ExecutionResponse {
    pub fn text(llm_response: impl Into<String>) -> Self {
        Self {
            llm_response: Some(llm_response.into()),
            parsed: None,
        }
    }

    pub fn with_parsed(mut self, parsed: serde_json::Value) -> Self {
        self.parsed = Some(parsed);
        self
    }
}

/// Outcome of a single check or assert evaluated against a test's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub expression: String,
    pub passed: bool,
}

/// Final result of a test execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Raw status reported by the engine
    pub status: RawStatus,
    /// Final raw LLM text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_response: Option<String>,
    /// Parsed output, if parsing succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<serde_json::Value>,
    /// Human-readable failure reason, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Checks and asserts evaluated against the output
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckResult>,
}

impl ExecutionResult {
    /// Create a result with the given status and nothing else.
    pub fn new(status: RawStatus) -> Self {
        Self {
            status,
            llm_response: None,
            parsed: None,
            failure_reason: None,
            checks: Vec::new(),
        }
    }

    pub fn llm_response(mut self, text: impl Into<String>) -> Self {
        self.llm_response = Some(text.into());
        self
    }

    pub fn parsed(mut self, value: serde_json::Value) -> Self {
        self.parsed = Some(value);
        self
    }

    pub fn failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    pub fn check(mut self, check: CheckResult) -> Self {
        self.checks.push(check);
        self
    }

    /// Names of checks that did not pass.
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect()
    }
}
