//! Outcome classification.
//!
//! A single table maps each raw status to both its fine-grained category and
//! its contribution to the suite verdict, so the two cannot drift apart.

use serde::{Deserialize, Serialize};

use playtest_runner::RawStatus;

use crate::summary::SuiteSummary;

/// Category of a completed test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Passed,
    LlmFailed,
    FinishReasonFailed,
    ParseFailed,
    ConstraintsFailed,
    Error,
}

impl OutcomeCategory {
    pub const ALL: [OutcomeCategory; 6] = [
        OutcomeCategory::Passed,
        OutcomeCategory::LlmFailed,
        OutcomeCategory::FinishReasonFailed,
        OutcomeCategory::ParseFailed,
        OutcomeCategory::ConstraintsFailed,
        OutcomeCategory::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::LlmFailed => "llm_failed",
            Self::FinishReasonFailed => "finish_reason_failed",
            Self::ParseFailed => "parse_failed",
            Self::ConstraintsFailed => "constraints_failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category and verdict for one raw status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: OutcomeCategory,
    pub verdict: SuiteSummary,
}

/// Verdict merged into the summary when the executor itself fails.
pub const EXECUTION_FAILURE_VERDICT: SuiteSummary = SuiteSummary::Fail;

/// Classify a raw status.
///
/// `ConstraintsFailed` and `AssertFailed` share a category but both fail the
/// suite. Unrecognized codes land in `error` and contribute `unknown`, which
/// leaves the summary untouched.
pub fn classify(status: RawStatus) -> Classification {
    use OutcomeCategory as C;
    use SuiteSummary as S;

    let (category, verdict) = match status {
        RawStatus::Passed => (C::Passed, S::Pass),
        RawStatus::LlmFailure => (C::LlmFailed, S::Fail),
        RawStatus::ParseFailure => (C::ParseFailed, S::Fail),
        RawStatus::FinishReasonFailed => (C::FinishReasonFailed, S::Warn),
        RawStatus::ConstraintsFailed => (C::ConstraintsFailed, S::Fail),
        RawStatus::AssertFailed => (C::ConstraintsFailed, S::Fail),
        RawStatus::UnableToRun => (C::Error, S::Fail),
        RawStatus::Unrecognized(_) => (C::Error, S::Unknown),
    };
    Classification { category, verdict }
}

/// Category for a raw status.
pub fn categorize(status: RawStatus) -> OutcomeCategory {
    classify(status).category
}
