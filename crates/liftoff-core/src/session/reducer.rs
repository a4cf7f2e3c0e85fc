//! Pure navigation rules.
//!
//! `reduce` maps the current state and one event to the next state plus the
//! clock bookkeeping the caller must perform. It never reads the clock and
//! never touches rendering or storage, so any host can drive it.
//!
//! ```text
//! Active  --advance (sets left / exercises left)--> Resting
//! Active  --advance (last set of last exercise)---> Complete
//! Active  --retreat-------------------------------> Active
//! Resting --skip_rest-----------------------------> Active
//! ```

use super::state::{Phase, SessionEvent, SessionState};
use crate::error::SessionError;
use crate::plan::ExercisePlan;

/// What the owner of the rest clock has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockCommand {
    /// Restart the clock from zero.
    Start,
    /// Stop the clock if it is running.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub clock: ClockCommand,
    /// Set only on the transition into `Complete`.
    pub completed: bool,
}

/// Apply one event.
///
/// # Errors
/// Returns [`SessionError::InvalidEvent`] when the current phase does not
/// accept `event`. This includes every event once the session is complete.
pub fn reduce(
    plan: &ExercisePlan,
    state: &SessionState,
    event: SessionEvent,
) -> Result<Transition, SessionError> {
    match (state.phase, event) {
        (Phase::Active, SessionEvent::Advance) => Ok(advance(plan, state)),
        (Phase::Active, SessionEvent::Retreat) => Ok(retreat(plan, state)),
        (Phase::Resting, SessionEvent::SkipRest) => Ok(Transition {
            state: SessionState {
                phase: Phase::Active,
                ..*state
            },
            clock: ClockCommand::Stop,
            completed: false,
        }),
        (phase, event) => Err(SessionError::InvalidEvent { event, phase }),
    }
}

fn target_sets(plan: &ExercisePlan, index: usize) -> u32 {
    plan.step(index)
        .map(|s| s.effective_target_sets())
        .unwrap_or(1)
}

fn advance(plan: &ExercisePlan, state: &SessionState) -> Transition {
    let rest = |exercise_index, set_number| Transition {
        state: SessionState {
            exercise_index,
            set_number,
            phase: Phase::Resting,
            rest_elapsed_secs: 0,
        },
        clock: ClockCommand::Start,
        completed: false,
    };

    if state.set_number < target_sets(plan, state.exercise_index) {
        rest(state.exercise_index, state.set_number + 1)
    } else if state.exercise_index + 1 < plan.len() {
        rest(state.exercise_index + 1, 1)
    } else {
        Transition {
            state: SessionState {
                phase: Phase::Complete,
                rest_elapsed_secs: 0,
                ..*state
            },
            clock: ClockCommand::Stop,
            completed: true,
        }
    }
}

fn retreat(plan: &ExercisePlan, state: &SessionState) -> Transition {
    let (exercise_index, set_number) = if state.set_number > 1 {
        (state.exercise_index, state.set_number - 1)
    } else if state.exercise_index > 0 {
        let previous = state.exercise_index - 1;
        (previous, target_sets(plan, previous))
    } else {
        (state.exercise_index, state.set_number)
    };

    Transition {
        state: SessionState {
            exercise_index,
            set_number,
            phase: Phase::Active,
            rest_elapsed_secs: 0,
        },
        // Retreat is only reachable from Active, but it must never leave a
        // rest clock running behind it.
        clock: ClockCommand::Stop,
        completed: false,
    }
}
