//! Run lifecycle events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use playtest_runner::ExecutionResponse;

use crate::counts::AggregateCounts;
use crate::state::TestState;
use crate::summary::SuiteSummary;

/// Published by the controller as a run progresses.
///
/// `RunStarted` is sent before any test executes, which is the signal for a
/// host to make the test panel visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        tests: Vec<String>,
    },
    TestStarted {
        test: String,
    },
    TestProgress {
        test: String,
        response: ExecutionResponse,
    },
    TestFinished {
        test: String,
        state: TestState,
        counts: AggregateCounts,
        summary: SuiteSummary,
    },
    RunFinished {
        run_id: Uuid,
        counts: AggregateCounts,
        summary: SuiteSummary,
    },
}
