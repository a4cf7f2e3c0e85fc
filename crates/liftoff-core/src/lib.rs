//! # Liftoff Core Library
//!
//! This library provides the workout session engine behind Liftoff. Every
//! operation is available through the standalone CLI binary; any other host
//! (a UI, a test harness) drives the same types.
//!
//! ## Architecture
//!
//! - **Session Engine**: a pure reducer plus a controller that owns the
//!   position in the plan, the phase, and the wall-clock rest timer. The caller
//!   feeds events and periodically invokes `tick()` for rest samples
//! - **Rewards**: a gateway trait for the external scoring service and a latch
//!   that allows at most one successful submission per session
//! - **Presenter**: formats the completion message
//! - **Storage**: SQLite workout history and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: Core session state machine
//! - [`ExercisePlan`]: Validated, immutable workout plan
//! - [`RewardsGateway`]: Trait for the external rewards service
//! - [`Database`]: Workout history persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod plan;
pub mod presenter;
pub mod rewards;
pub mod session;
pub mod storage;

pub use error::{
    ConfigError, CoreError, DatabaseError, RewardsError, SessionError, SubmissionError,
    ValidationError,
};
pub use events::Event;
pub use plan::{ExerciseInfo, ExercisePlan, ExerciseStep};
pub use presenter::{present, CompletionMessage};
pub use rewards::{
    CompletionReport, HttpRewardsGateway, RewardSummary, RewardsGateway, SubmissionLatch,
};
pub use session::{Phase, RestClock, RestTicker, SessionController, SessionEvent, SessionState};
pub use storage::{Config, Database, WorkoutRecord, WorkoutStats};
