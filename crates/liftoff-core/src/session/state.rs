use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Performing a set.
    Active,
    /// Timed pause between sets or exercises.
    Resting,
    /// Terminal. Every navigation event is ignored from here on.
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Active => "active",
            Phase::Resting => "resting",
            Phase::Complete => "complete",
        })
    }
}

/// Discrete navigation events the host feeds into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    Advance,
    Retreat,
    SkipRest,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionEvent::Advance => "advance",
            SessionEvent::Retreat => "retreat",
            SessionEvent::SkipRest => "skip_rest",
        })
    }
}

/// Position and phase of a running session.
///
/// `exercise_index` is always a valid index into the plan and `set_number`
/// stays within `1..=effective_target_sets` of that exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub exercise_index: usize,
    pub set_number: u32,
    pub phase: Phase,
    /// Only meaningful while resting; zeroed on every entry into `Resting`.
    pub rest_elapsed_secs: u64,
}

impl SessionState {
    pub fn initial() -> Self {
        Self {
            exercise_index: 0,
            set_number: 1,
            phase: Phase::Active,
            rest_elapsed_secs: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
