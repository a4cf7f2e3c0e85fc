//! Session controller.
//!
//! Owns the state of one workout session: it runs every event through the
//! reducer, keeps the rest clock in step with the phase, and guards the one
//! rewards submission a finished session is entitled to.
//!
//! Like the rest clock, the controller has no thread of its own. The host
//! feeds it events and calls `tick()` whenever it wants a fresh rest sample.
//!
//! ```ignore
//! let mut session = SessionController::start(plan)?;
//! session.advance();           // Some(Event::RestStarted { .. })
//! session.tick();              // Some(Event::RestTick { .. })
//! session.skip_rest();         // Some(Event::RestSkipped { .. })
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::{now_ms, RestClock};
use super::reducer::{reduce, ClockCommand};
use super::state::{Phase, SessionEvent, SessionState};
use crate::error::{CoreError, RewardsError, SessionError, SubmissionError, ValidationError};
use crate::events::Event;
use crate::plan::{ExercisePlan, ExerciseStep};
use crate::rewards::{CompletionReport, RewardSummary, RewardsGateway, SubmissionLatch};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionController {
    session_id: Uuid,
    plan: ExercisePlan,
    state: SessionState,
    clock: RestClock,
    #[serde(default)]
    latch: SubmissionLatch,
    started_at: DateTime<Utc>,
}

impl SessionController {
    /// Begin a session at the first set of the first exercise.
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyPlan`] if the plan has no exercises.
    pub fn start(plan: ExercisePlan) -> Result<Self, SessionError> {
        if plan.is_empty() {
            return Err(SessionError::EmptyPlan);
        }
        let session = Self {
            session_id: Uuid::new_v4(),
            plan,
            state: SessionState::initial(),
            clock: RestClock::new(),
            latch: SubmissionLatch::new(),
            started_at: Utc::now(),
        };
        tracing::info!(
            session_id = %session.session_id,
            workout_id = %session.plan.workout_id,
            exercises = session.plan.len(),
            "session started"
        );
        Ok(session)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn plan(&self) -> &ExercisePlan {
        &self.plan
    }

    /// Copy of the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn current_step(&self) -> Option<&ExerciseStep> {
        self.plan.step(self.state.exercise_index)
    }

    pub fn is_rest_clock_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn is_submitting(&self) -> bool {
        self.latch.is_in_flight()
    }

    /// The rewards granted to this session, once a submission succeeded.
    pub fn rewards(&self) -> Option<&RewardSummary> {
        self.latch.accepted()
    }

    pub fn failed_submissions(&self) -> u32 {
        self.latch.failed_attempts()
    }

    /// Totals for the rewards service, available only once complete.
    ///
    /// # Errors
    /// Returns [`SessionError::NotComplete`] before the terminal transition.
    pub fn completion_report(&self) -> Result<CompletionReport, SessionError> {
        if !self.state.is_complete() {
            return Err(SessionError::NotComplete);
        }
        Ok(CompletionReport {
            total_exercises: self.plan.len() as u32,
            total_completed_sets: self.plan.total_sets(),
            reference_id: self.plan.workout_id.clone(),
        })
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            session_id: self.session_id,
            workout_id: self.plan.workout_id.clone(),
            phase: self.state.phase,
            state: self.state,
            exercise_count: self.plan.len(),
            step: self.current_step().cloned(),
            is_submitting: self.is_submitting(),
            rewards_submitted: self.rewards().is_some(),
            at: Utc::now(),
        }
    }

    pub fn started_event(&self) -> Event {
        Event::SessionStarted {
            session_id: self.session_id,
            workout_id: self.plan.workout_id.clone(),
            total_exercises: self.plan.len() as u32,
            total_sets: self.plan.total_sets(),
            at: self.started_at,
        }
    }

    /// Check a session that arrived through deserialization: the plan must
    /// pass [`ExercisePlan::validate`] and the position must lie inside it.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.plan.validate()?;
        let step = self
            .current_step()
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "state.exercise_index".into(),
                message: format!(
                    "{} is outside a plan of {} exercises",
                    self.state.exercise_index,
                    self.plan.len()
                ),
            })?;
        let max_set = step.effective_target_sets();
        if !(1..=max_set).contains(&self.state.set_number) {
            return Err(ValidationError::InvalidValue {
                field: "state.set_number".into(),
                message: format!("{} is outside 1..={max_set}", self.state.set_number),
            });
        }
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Finish the current set. Returns `None` when ignored.
    pub fn advance(&mut self) -> Option<Event> {
        self.advance_at(now_ms())
    }

    pub fn advance_at(&mut self, now_ms: u64) -> Option<Event> {
        let transition = self.dispatch(SessionEvent::Advance, now_ms)?;
        if transition.completed {
            let report = self.completion_report().ok()?;
            tracing::info!(
                session_id = %self.session_id,
                sets = report.total_completed_sets,
                "session complete"
            );
            return Some(Event::SessionCompleted {
                session_id: self.session_id,
                report,
                at: Utc::now(),
            });
        }
        Some(Event::RestStarted {
            exercise_index: self.state.exercise_index,
            set_number: self.state.set_number,
            at: Utc::now(),
        })
    }

    /// Step back one set. Returns `None` when ignored or already at the start.
    pub fn retreat(&mut self) -> Option<Event> {
        let before = self.state;
        self.dispatch(SessionEvent::Retreat, now_ms())?;
        if self.state == before {
            return None;
        }
        Some(Event::Retreated {
            exercise_index: self.state.exercise_index,
            set_number: self.state.set_number,
            at: Utc::now(),
        })
    }

    /// End the rest early. Returns `None` unless resting.
    pub fn skip_rest(&mut self) -> Option<Event> {
        self.skip_rest_at(now_ms())
    }

    pub fn skip_rest_at(&mut self, now_ms: u64) -> Option<Event> {
        self.sample(now_ms);
        let rest_elapsed_secs = self.state.rest_elapsed_secs;
        self.dispatch(SessionEvent::SkipRest, now_ms)?;
        Some(Event::RestSkipped {
            exercise_index: self.state.exercise_index,
            set_number: self.state.set_number,
            rest_elapsed_secs,
            at: Utc::now(),
        })
    }

    /// Sample the rest clock. Returns `None` unless resting.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Option<Event> {
        if !self.sample(now_ms) {
            return None;
        }
        Some(Event::RestTick {
            rest_elapsed_secs: self.state.rest_elapsed_secs,
            at: Utc::now(),
        })
    }

    /// Tear the session down. The rest clock is stopped and no rewards are
    /// submitted, whatever the phase.
    pub fn teardown(mut self) -> Event {
        self.clock.stop();
        let completed = self.state.is_complete();
        if !completed {
            tracing::info!(session_id = %self.session_id, "session abandoned");
        }
        Event::SessionEnded {
            session_id: self.session_id,
            completed,
            at: Utc::now(),
        }
    }

    // ── Rewards ──────────────────────────────────────────────────────

    /// Claim the submission latch and get the report to send.
    ///
    /// # Errors
    /// Fails unless the session is complete and the latch is free.
    pub fn begin_submission(
        &mut self,
        max_attempts: u32,
    ) -> Result<CompletionReport, SubmissionError> {
        let report = self
            .completion_report()
            .map_err(|_| SubmissionError::NotComplete)?;
        self.latch.acquire(max_attempts)?;
        Ok(report)
    }

    /// Release the latch with the gateway's answer. A failure leaves the
    /// session complete so the athlete can retry.
    pub fn finish_submission(
        &mut self,
        outcome: Result<RewardSummary, RewardsError>,
    ) -> Result<RewardSummary, RewardsError> {
        match &outcome {
            Ok(summary) => {
                tracing::info!(
                    session_id = %self.session_id,
                    points = summary.points_gained,
                    level = summary.new_level,
                    "rewards accepted"
                );
                self.latch.release_success(summary.clone());
            }
            Err(e) => {
                self.latch.release_failure();
                tracing::warn!(
                    session_id = %self.session_id,
                    attempts = self.latch.failed_attempts(),
                    "rewards submission failed: {e}"
                );
            }
        }
        outcome
    }

    /// Submit the completion report through `gateway`, at most once.
    ///
    /// # Errors
    /// Returns a submission error if the latch refuses, or the gateway error
    /// if the request fails.
    pub async fn submit_rewards<G: RewardsGateway>(
        &mut self,
        gateway: &G,
        max_attempts: u32,
    ) -> Result<RewardSummary, CoreError> {
        let report = self.begin_submission(max_attempts)?;
        let outcome = gateway.submit(&report).await;
        Ok(self.finish_submission(outcome)?)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn dispatch(
        &mut self,
        event: SessionEvent,
        now_ms: u64,
    ) -> Option<super::reducer::Transition> {
        match reduce(&self.plan, &self.state, event) {
            Ok(transition) => {
                match transition.clock {
                    ClockCommand::Start => self.clock.start_at(now_ms),
                    ClockCommand::Stop => self.clock.stop(),
                }
                self.state = transition.state;
                tracing::debug!(
                    %event,
                    phase = %self.state.phase,
                    exercise_index = self.state.exercise_index,
                    set_number = self.state.set_number,
                    "transition"
                );
                Some(transition)
            }
            Err(e) => {
                tracing::debug!("ignoring event: {e}");
                None
            }
        }
    }

    /// Refresh `rest_elapsed_secs`; false unless resting.
    fn sample(&mut self, now_ms: u64) -> bool {
        if self.state.phase != Phase::Resting {
            return false;
        }
        let elapsed = self.clock.elapsed_secs_at(now_ms);
        self.state.rest_elapsed_secs = self.state.rest_elapsed_secs.max(elapsed);
        true
    }
}
