//! Rewards submission.
//!
//! Scoring, levels, achievements and badges are computed by an external
//! service. This module only defines what is sent to it, what comes back, and
//! the latch that keeps a session from being rewarded twice.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::RewardsError;

mod http;
mod latch;

pub use http::{HttpRewardsGateway, TOKEN_ENV};
pub use latch::SubmissionLatch;

/// Summary of a finished session, produced once per terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub total_exercises: u32,
    /// Derived from the plan's static targets, never from a running counter.
    pub total_completed_sets: u32,
    /// The plan's workout identifier.
    pub reference_id: String,
}

/// What the rewards service grants for a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSummary {
    pub points_gained: u32,
    pub new_level: u32,
    #[serde(default)]
    pub new_achievements: Vec<String>,
    #[serde(default)]
    pub new_badges: Vec<String>,
}

/// The external rewards service.
///
/// Implementations perform exactly one request per call; retry policy is the
/// caller's business (see [`SubmissionLatch`]).
pub trait RewardsGateway {
    fn submit(
        &self,
        report: &CompletionReport,
    ) -> impl Future<Output = Result<RewardSummary, RewardsError>> + Send;
}
