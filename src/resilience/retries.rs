//! Retry policy for dispatched transactions.
//!
//! Only a sequence mismatch is retried: the session has already been
//! flagged for resync, so the next attempt signs with a fresh sequence.
//! Network failures and rejections are returned to the caller as-is.

use std::time::Duration;

use crate::pipeline::{FailureKind, TxOutcome};
use crate::resilience::backoff::calculate_backoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// `attempt` counts retries already made.
    pub fn should_retry(&self, outcome: &TxOutcome, attempt: u32) -> bool {
        attempt < self.max_retries && outcome.kind() == Some(FailureKind::SequenceMismatch)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_sequence_mismatch_is_retried() {
        let policy = RetryPolicy::default();
        let mismatch = TxOutcome::failure(FailureKind::SequenceMismatch, "account sequence mismatch");

        assert!(policy.should_retry(&mismatch, 0));
        assert!(!policy.should_retry(&mismatch, 1));
        assert!(!policy.should_retry(&TxOutcome::failure(FailureKind::Network, "timeout"), 0));
        assert!(!policy.should_retry(&TxOutcome::failure(FailureKind::Rejected, "insufficient funds"), 0));
    }

    #[test]
    fn test_delay_uses_backoff() {
        let policy = RetryPolicy {
            max_retries: 1,
            base_delay_ms: 50,
            max_delay_ms: 50,
        };
        let delay = policy.delay(1);
        assert!(delay >= Duration::from_millis(50) && delay < Duration::from_millis(55));
    }
}
