//! Completion message formatting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rewards::{CompletionReport, RewardSummary};

const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub title: String,
    pub lines: Vec<String>,
}

impl fmt::Display for CompletionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;
        for line in &self.lines {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

/// Build the message shown once rewards come back.
///
/// `prior_level` is the athlete's level before this workout, when known. The
/// level line only celebrates a level-up if it is known and lower.
pub fn present(
    report: &CompletionReport,
    rewards: &RewardSummary,
    prior_level: Option<u32>,
) -> CompletionMessage {
    let mut lines = vec![
        format!(
            "Exercises completed: {}. Sets completed: {}.",
            report.total_exercises, report.total_completed_sets
        ),
        format!("You earned {} points!", rewards.points_gained),
    ];

    match prior_level {
        Some(prior) if rewards.new_level > prior => {
            lines.push(format!("Leveled up to {}!", rewards.new_level));
        }
        _ => lines.push(format!("Level {} reached.", rewards.new_level)),
    }

    if !rewards.new_achievements.is_empty() {
        lines.push(format!(
            "New Achievements: {}",
            rewards.new_achievements.join(LIST_SEPARATOR)
        ));
    }
    if !rewards.new_badges.is_empty() {
        lines.push(format!(
            "New Badges: {}",
            rewards.new_badges.join(LIST_SEPARATOR)
        ));
    }

    CompletionMessage {
        title: "Workout Complete!".into(),
        lines,
    }
}
