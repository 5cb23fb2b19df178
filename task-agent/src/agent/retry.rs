//! Bounded retry accounting for judgment and decision loops.

use serde::{Deserialize, Serialize};

/// Reason string attached to a judgment that passed only because its retry
/// budget ran out.
pub const MAX_RETRIES_REASON: &str = "Max retries reached, proceeding";

/// Outcome of recording a pass/fail result against a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryVerdict {
    /// A genuine pass; the counter has been reset.
    Pass,
    /// A failure that exhausted the budget; the caller must proceed as if it
    /// had passed.
    ForcedPass,
    /// A failure with budget remaining.
    Fail,
}

/// Counts consecutive failures against a fixed limit.
///
/// Each checkpoint in the workflow owns its own counter; budgets are never
/// shared. A pass resets the count to zero, so only uninterrupted failure
/// streaks can exhaust a budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryCounter {
    count: u32,
    limit: u32,
}

impl RetryCounter {
    pub const DEFAULT_LIMIT: u32 = 3;

    /// A limit of zero would force-pass before the first real attempt, so it
    /// is clamped to one.
    pub fn new(limit: u32) -> Self {
        Self {
            count: 0,
            limit: limit.max(1),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Record the result of one attempt and report how the caller should
    /// route. After exactly `limit` consecutive failures the verdict flips to
    /// [`RetryVerdict::ForcedPass`].
    pub fn record_outcome(&mut self, passed: bool) -> RetryVerdict {
        if passed {
            self.count = 0;
            return RetryVerdict::Pass;
        }
        if self.count < self.limit {
            self.count += 1;
        }
        if self.count >= self.limit {
            RetryVerdict::ForcedPass
        } else {
            RetryVerdict::Fail
        }
    }
}

impl Default for RetryCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}
