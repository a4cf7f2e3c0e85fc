use serde::{Deserialize, Serialize};

use super::RewardSummary;
use crate::error::SubmissionError;

/// Guards the rewards request of one session.
///
/// At most one attempt is in flight at a time, at most one attempt ever
/// succeeds, and failures are counted so retries stay bounded.
///
/// The in-flight flag is not persisted: a process that died mid-request must
/// not leave a stored session that can never be submitted. Hosts that share a
/// stored session across processes also take
/// [`Database::claim_submission`](crate::storage::Database::claim_submission).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionLatch {
    #[serde(skip)]
    in_flight: bool,
    #[serde(default)]
    failed_attempts: u32,
    #[serde(default)]
    accepted: Option<RewardSummary>,
}

impl SubmissionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to issue one request.
    ///
    /// # Errors
    /// Refuses when a request is pending, when one already succeeded, or when
    /// `max_attempts` failures have been recorded.
    pub fn acquire(&mut self, max_attempts: u32) -> Result<(), SubmissionError> {
        if self.accepted.is_some() {
            return Err(SubmissionError::AlreadySubmitted);
        }
        if self.in_flight {
            return Err(SubmissionError::InFlight);
        }
        if self.failed_attempts >= max_attempts {
            return Err(SubmissionError::AttemptsExhausted {
                attempts: self.failed_attempts,
            });
        }
        self.in_flight = true;
        Ok(())
    }

    pub fn release_failure(&mut self) {
        if self.in_flight {
            self.in_flight = false;
            self.failed_attempts += 1;
        }
    }

    pub fn release_success(&mut self, summary: RewardSummary) {
        self.in_flight = false;
        self.accepted = Some(summary);
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn accepted(&self) -> Option<&RewardSummary> {
        self.accepted.as_ref()
    }
}
