//! Per-step work budget for the time-boxed initialization loops
//!
//! The driving loop decides how much materialization work each tick may do;
//! the core never consults a host clock of its own. A budget always grants
//! at least one record so a too-small budget cannot stall initialization.

use std::time::{Duration, Instant};

/// Bounds one initialization step by wall-clock time, record count, or both.
#[derive(Clone, Debug)]
pub struct StepBudget {
    deadline: Option<Instant>,
    records: Option<u64>,
    granted: bool,
}

impl StepBudget {
    /// Stop pulling records once `limit` has elapsed.
    pub fn by_duration(limit: Duration) -> Self {
        StepBudget {
            deadline: Some(Instant::now() + limit),
            records: None,
            granted: false,
        }
    }

    /// Materialize at most `count` records this step.
    pub fn by_records(count: u64) -> Self {
        StepBudget {
            deadline: None,
            records: Some(count),
            granted: false,
        }
    }

    /// No bound; the whole remaining message is processed in one step.
    pub fn unbounded() -> Self {
        StepBudget {
            deadline: None,
            records: None,
            granted: false,
        }
    }

    /// Ask for permission to process one more record. The first request per
    /// budget is always granted.
    pub fn take(&mut self) -> bool {
        if !self.granted {
            self.granted = true;
            if let Some(records) = &mut self.records {
                *records = records.saturating_sub(1);
            }
            return true;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return false;
            }
        }
        if let Some(records) = &mut self.records {
            if *records == 0 {
                return false;
            }
            *records -= 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_budget_counts_down() {
        let mut budget = StepBudget::by_records(2);
        assert!(budget.take());
        assert!(budget.take());
        assert!(!budget.take());
    }

    #[test]
    fn first_record_always_granted() {
        let mut budget = StepBudget::by_duration(Duration::ZERO);
        assert!(budget.take());
        assert!(!budget.take());

        let mut budget = StepBudget::by_records(0);
        assert!(budget.take());
        assert!(!budget.take());
    }

    #[test]
    fn unbounded_never_stops() {
        let mut budget = StepBudget::unbounded();
        for _ in 0..10_000 {
            assert!(budget.take());
        }
    }
}
