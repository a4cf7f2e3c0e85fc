use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::ExerciseStep;
use crate::rewards::CompletionReport;
use crate::session::{Phase, SessionState};

/// Every state change of a session produces an Event.
/// Hosts render from them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        workout_id: String,
        total_exercises: u32,
        total_sets: u32,
        at: DateTime<Utc>,
    },
    /// A set was finished and the rest before `set_number` began.
    RestStarted {
        exercise_index: usize,
        set_number: u32,
        at: DateTime<Utc>,
    },
    /// Periodic sample of the rest clock.
    RestTick {
        rest_elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    RestSkipped {
        exercise_index: usize,
        set_number: u32,
        rest_elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    Retreated {
        exercise_index: usize,
        set_number: u32,
        at: DateTime<Utc>,
    },
    /// Emitted exactly once, on the terminal transition.
    SessionCompleted {
        session_id: Uuid,
        report: CompletionReport,
        at: DateTime<Utc>,
    },
    /// The host tore the session down.
    SessionEnded {
        session_id: Uuid,
        /// False when the athlete left before finishing.
        completed: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_id: Uuid,
        workout_id: String,
        phase: Phase,
        state: SessionState,
        exercise_count: usize,
        step: Option<ExerciseStep>,
        is_submitting: bool,
        rewards_submitted: bool,
        at: DateTime<Utc>,
    },
}
