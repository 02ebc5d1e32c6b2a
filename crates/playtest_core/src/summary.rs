//! Suite-level verdict and the rule for merging per-test verdicts into it.

use serde::{Deserialize, Serialize};

use playtest_runner::RawStatus;

use crate::classifier::classify;

/// Worst-case-so-far verdict for a run.
///
/// `unknown` means nothing has completed yet, `pass` that everything so far
/// passed, `warn` that at least one soft check failed, and `fail` that at
/// least one assert failed or a test could not be executed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SuiteSummary {
    #[default]
    Unknown,
    Pass,
    Warn,
    Fail,
}

impl SuiteSummary {
    pub const ALL: [SuiteSummary; 4] = [
        SuiteSummary::Unknown,
        SuiteSummary::Pass,
        SuiteSummary::Warn,
        SuiteSummary::Fail,
    ];

    pub fn priority(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Pass => 1,
            Self::Warn => 2,
            Self::Fail => 3,
        }
    }

    /// Keep whichever of the two has the higher priority.
    ///
    /// Ties keep `self`, so the summary never moves sideways.
    #[must_use]
    pub fn merge(self, candidate: SuiteSummary) -> SuiteSummary {
        if candidate.priority() > self.priority() {
            candidate
        } else {
            self
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

impl std::fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Merge the verdict for a raw status into the current summary.
pub fn resolve(current: SuiteSummary, status: RawStatus) -> SuiteSummary {
    current.merge(classify(status).verdict)
}
