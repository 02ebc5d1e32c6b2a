//! Per-test lifecycle state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use playtest_runner::{ExecutionResponse, ExecutionResult};

use crate::classifier::OutcomeCategory;
use crate::error::{CoreError, CoreResult};

/// Lifecycle of a single test within a run.
///
/// Transitions only move forward: `Queued -> Running -> Done | Failed`.
/// `Running -> Running` is allowed to replace the latest intermediate
/// response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestState {
    Queued,
    Running {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        latest_intermediate: Option<ExecutionResponse>,
    },
    Done {
        category: OutcomeCategory,
        result: ExecutionResult,
        latency_ms: u64,
    },
    Failed {
        message: String,
    },
}

impl TestState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running { .. } => "running",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed { .. })
    }

    fn can_become(&self, next: &TestState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running { .. })
                | (Self::Running { .. }, Self::Running { .. })
                | (Self::Running { .. }, Self::Done { .. })
                | (Self::Running { .. }, Self::Failed { .. })
        )
    }
}

/// Tracks one [`TestState`] per test name.
///
/// Resetting happens in two discrete steps: [`purge_all`](Self::purge_all)
/// drops every entry and starts discarding writes, then
/// [`end_purge`](Self::end_purge) stops discarding. Entries for the new run
/// must be written after the second step.
#[derive(Debug, Default)]
pub struct StateTracker {
    states: HashMap<String, TestState>,
    order: Vec<String>,
    purging: bool,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every tracked entry and discard writes until `end_purge`.
    pub fn purge_all(&mut self) {
        debug!("Purging {} test states", self.states.len());
        self.states.clear();
        self.order.clear();
        self.purging = true;
    }

    /// Stop discarding writes.
    pub fn end_purge(&mut self) {
        self.purging = false;
    }

    pub fn is_purging(&self) -> bool {
        self.purging
    }

    /// Track every name as `Queued`. Duplicate names collapse to one entry.
    ///
    /// Returns the number of distinct names now tracked.
    pub fn enqueue<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.put(name.as_ref(), TestState::Queued);
        }
        self.states.len()
    }

    fn put(&mut self, name: &str, state: TestState) {
        if self.purging {
            debug!(test = name, "Discarding write while purging");
            return;
        }
        if self.states.insert(name.to_string(), state).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&TestState> {
        self.states.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Tracked names in the order they were first enqueued.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// All tracked states in enqueue order.
    pub fn snapshot(&self) -> Vec<(String, TestState)> {
        self.order
            .iter()
            .filter_map(|name| self.states.get(name).map(|s| (name.clone(), s.clone())))
            .collect()
    }

    fn transition(&mut self, name: &str, next: TestState) -> CoreResult<()> {
        let current = self
            .states
            .get(name)
            .ok_or_else(|| CoreError::UnknownTest(name.to_string()))?;
        if !current.can_become(&next) {
            return Err(CoreError::InvalidTransition {
                test: name.to_string(),
                from: current.label(),
                to: next.label(),
            });
        }
        debug!(test = name, from = current.label(), to = next.label(), "Test transition");
        self.put(name, next);
        Ok(())
    }

    /// Queued -> Running.
    pub fn start(&mut self, name: &str) -> CoreResult<()> {
        match self.states.get(name) {
            Some(TestState::Queued) => self.transition(
                name,
                TestState::Running {
                    latest_intermediate: None,
                },
            ),
            Some(other) => Err(CoreError::InvalidTransition {
                test: name.to_string(),
                from: other.label(),
                to: "running",
            }),
            None => Err(CoreError::UnknownTest(name.to_string())),
        }
    }

    /// Replace the latest intermediate response of a running test.
    pub fn record_intermediate(&mut self, name: &str, response: ExecutionResponse) -> CoreResult<()> {
        match self.states.get(name) {
            Some(TestState::Running { .. }) => self.transition(
                name,
                TestState::Running {
                    latest_intermediate: Some(response),
                },
            ),
            Some(other) => Err(CoreError::InvalidTransition {
                test: name.to_string(),
                from: other.label(),
                to: "running",
            }),
            None => Err(CoreError::UnknownTest(name.to_string())),
        }
    }

    /// Running -> Done.
    pub fn complete(
        &mut self,
        name: &str,
        category: OutcomeCategory,
        result: ExecutionResult,
        latency_ms: u64,
    ) -> CoreResult<()> {
        self.transition(
            name,
            TestState::Done {
                category,
                result,
                latency_ms,
            },
        )
    }

    /// Running -> Failed.
    pub fn fail(&mut self, name: &str, message: impl Into<String>) -> CoreResult<()> {
        self.transition(
            name,
            TestState::Failed {
                message: message.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use playtest_runner::RawStatus;

    use super::*;

    fn tracker_with(names: &[&str]) -> StateTracker {
        let mut tracker = StateTracker::new();
        tracker.enqueue(names.iter().copied());
        tracker
    }

    #[test]
    fn test_enqueue_collapses_duplicates() {
        let mut tracker = StateTracker::new();
        let count = tracker.enqueue(["a", "b", "a"]);
        assert_eq!(count, 2);
        assert_eq!(tracker.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(tracker.get("a"), Some(&TestState::Queued));
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut tracker = tracker_with(&["t1"]);
        tracker.start("t1").unwrap();
        tracker
            .record_intermediate("t1", ExecutionResponse::text("par"))
            .unwrap();
        tracker
            .record_intermediate("t1", ExecutionResponse::text("partial"))
            .unwrap();

        match tracker.get("t1").unwrap() {
            TestState::Running {
                latest_intermediate: Some(r),
            } => assert_eq!(r.llm_response.as_deref(), Some("partial")),
            other => panic!("unexpected state {other:?}"),
        }

        tracker
            .complete(
                "t1",
                OutcomeCategory::Passed,
                ExecutionResult::new(RawStatus::Passed),
                12,
            )
            .unwrap();
        let state = tracker.get("t1").unwrap();
        assert!(state.is_terminal());
        assert_eq!(state.label(), "done");
    }

    #[test]
    fn test_transitions_never_go_backwards() {
        let mut tracker = tracker_with(&["t1"]);

        // Cannot finish a test that never started.
        assert!(matches!(
            tracker.fail("t1", "boom"),
            Err(CoreError::InvalidTransition { from: "queued", .. })
        ));

        tracker.start("t1").unwrap();
        assert!(tracker.start("t1").is_err());
        tracker.fail("t1", "boom").unwrap();

        assert!(tracker.start("t1").is_err());
        assert!(tracker
            .record_intermediate("t1", ExecutionResponse::default())
            .is_err());
        assert!(tracker
            .complete(
                "t1",
                OutcomeCategory::Passed,
                ExecutionResult::new(RawStatus::Passed),
                1
            )
            .is_err());
        assert_eq!(
            tracker.get("t1"),
            Some(&TestState::Failed {
                message: "boom".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_test() {
        let mut tracker = StateTracker::new();
        assert!(matches!(tracker.start("ghost"), Err(CoreError::UnknownTest(_))));
    }

    #[test]
    fn test_purge_discards_writes_until_ended() {
        let mut tracker = tracker_with(&["old"]);
        tracker.purge_all();
        assert!(tracker.is_empty());

        tracker.enqueue(["too_early"]);
        assert!(!tracker.contains("too_early"));

        tracker.end_purge();
        tracker.enqueue(["new"]);
        assert!(tracker.contains("new"));
        assert!(!tracker.contains("old"));
        assert_eq!(tracker.names(), &["new".to_string()]);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(TestState::Failed {
            message: "boom".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(TestState::Running {
            latest_intermediate: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "running"}));
    }
}
