//! Live aggregate counters for a run.

use serde::{Deserialize, Serialize};

use crate::classifier::OutcomeCategory;

/// Completed tests per outcome category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoneCounts {
    pub passed: usize,
    pub llm_failed: usize,
    pub finish_reason_failed: usize,
    pub parse_failed: usize,
    pub constraints_failed: usize,
    pub error: usize,
}

impl DoneCounts {
    pub fn get(&self, category: OutcomeCategory) -> usize {
        match category {
            OutcomeCategory::Passed => self.passed,
            OutcomeCategory::LlmFailed => self.llm_failed,
            OutcomeCategory::FinishReasonFailed => self.finish_reason_failed,
            OutcomeCategory::ParseFailed => self.parse_failed,
            OutcomeCategory::ConstraintsFailed => self.constraints_failed,
            OutcomeCategory::Error => self.error,
        }
    }

    fn slot(&mut self, category: OutcomeCategory) -> &mut usize {
        match category {
            OutcomeCategory::Passed => &mut self.passed,
            OutcomeCategory::LlmFailed => &mut self.llm_failed,
            OutcomeCategory::FinishReasonFailed => &mut self.finish_reason_failed,
            OutcomeCategory::ParseFailed => &mut self.parse_failed,
            OutcomeCategory::ConstraintsFailed => &mut self.constraints_failed,
            OutcomeCategory::Error => &mut self.error,
        }
    }

    pub fn total(&self) -> usize {
        OutcomeCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Running totals per lifecycle status.
///
/// `queued + running + done.total() + error` always equals the number of
/// tests in the current run. Each method moves exactly one test between
/// buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounts {
    pub queued: usize,
    pub running: usize,
    pub done: DoneCounts,
    /// Tests whose executor failed (distinct from `done.error`)
    pub error: usize,
}

impl AggregateCounts {
    /// Counts for a fresh run with `total` queued tests.
    pub fn new(total: usize) -> Self {
        Self {
            queued: total,
            ..Self::default()
        }
    }

    /// Queued -> running.
    pub fn start_one(&mut self) {
        debug_assert!(self.queued > 0, "no queued test to start");
        self.queued = self.queued.saturating_sub(1);
        self.running += 1;
    }

    /// Running -> done under `category`.
    pub fn finish_done(&mut self, category: OutcomeCategory) {
        debug_assert!(self.running > 0, "no running test to finish");
        self.running = self.running.saturating_sub(1);
        *self.done.slot(category) += 1;
    }

    /// Running -> error.
    pub fn finish_error(&mut self) {
        debug_assert!(self.running > 0, "no running test to fail");
        self.running = self.running.saturating_sub(1);
        self.error += 1;
    }

    pub fn total(&self) -> usize {
        self.queued + self.running + self.done.total() + self.error
    }

    /// Number of tests that have settled.
    pub fn settled(&self) -> usize {
        self.done.total() + self.error
    }

    /// True when nothing is queued or running.
    pub fn is_settled(&self) -> bool {
        self.queued == 0 && self.running == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_counts() {
        let counts = AggregateCounts::new(3);
        assert_eq!(counts.queued, 3);
        assert_eq!(counts.running, 0);
        assert_eq!(counts.done, DoneCounts::default());
        assert_eq!(counts.error, 0);
        assert_eq!(counts.total(), 3);
        assert!(!counts.is_settled());
    }

    #[test]
    fn test_total_is_conserved() {
        let mut counts = AggregateCounts::new(3);
        counts.start_one();
        assert_eq!((counts.queued, counts.running), (2, 1));
        assert_eq!(counts.total(), 3);

        counts.finish_done(OutcomeCategory::FinishReasonFailed);
        counts.start_one();
        counts.finish_error();
        counts.start_one();
        counts.finish_done(OutcomeCategory::ConstraintsFailed);

        assert_eq!(counts.total(), 3);
        assert!(counts.is_settled());
        assert_eq!(counts.settled(), 3);
        assert_eq!(counts.done.finish_reason_failed, 1);
        assert_eq!(counts.done.constraints_failed, 1);
        assert_eq!(counts.error, 1);
        assert_eq!(counts.done.error, 0);
    }

    #[test]
    fn test_done_get_matches_fields() {
        let mut done = DoneCounts::default();
        for (i, category) in OutcomeCategory::ALL.iter().enumerate() {
            for _ in 0..=i {
                *done.slot(*category) += 1;
            }
        }
        assert_eq!(done.get(OutcomeCategory::Passed), 1);
        assert_eq!(done.get(OutcomeCategory::Error), 6);
        assert_eq!(done.total(), 21);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(AggregateCounts::new(2)).unwrap();
        assert_eq!(json["queued"], 2);
        assert_eq!(json["done"]["llm_failed"], 0);
        assert_eq!(json["error"], 0);
    }
}
