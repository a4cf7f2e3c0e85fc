use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Subcommand;
use liftoff_core::storage::Database;
use liftoff_core::{
    present, Config, Event, HttpRewardsGateway, Phase, RestTicker, SessionController,
    SubmissionError,
};
use uuid::Uuid;

use super::plan::load_plan;

const SESSION_KEY: &str = "active_session";
const NO_SESSION: &str = "no active session; run `session start` first";

/// Slack on top of the request timeout before a submission claim counts as
/// abandoned by a dead process.
const CLAIM_GRACE_SECS: u64 = 30;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a new session at the first set of the first exercise
    Start {
        /// Plan file (.toml or .json); the built-in sample plan when omitted
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Abandon the active session, if any, first
        #[arg(long)]
        force: bool,
    },
    /// Finish the current set
    Advance,
    /// Go back one set
    Retreat,
    /// End the current rest early
    SkipRest,
    /// Print the current session state as JSON
    Status,
    /// Follow the rest clock live; press Enter to skip the rest
    Rest,
    /// Submit the finished workout for rewards
    Submit,
    /// Abandon the active session
    Abandon,
}

fn load_session(db: &Database) -> Result<Option<SessionController>, Box<dyn std::error::Error>> {
    let Some(json) = db.kv_get(SESSION_KEY)? else {
        return Ok(None);
    };
    let session: SessionController = serde_json::from_str(&json)?;
    session
        .validate()
        .map_err(|e| format!("stored session is invalid ({e}); run `session abandon`"))?;
    Ok(Some(session))
}

fn discard_unreadable_session(
    db: &Database,
    err: &dyn std::error::Error,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::warn!("discarding unreadable session: {err}");
    db.kv_delete(SESSION_KEY)?;
    Ok(())
}

fn require_session(db: &Database) -> Result<SessionController, Box<dyn std::error::Error>> {
    load_session(db)?.ok_or_else(|| NO_SESSION.into())
}

fn save_session(db: &Database, session: &SessionController) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(session)?;
    db.kv_set(SESSION_KEY, &json)?;
    Ok(())
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

/// Print the event, or the current snapshot when the command was ignored.
fn print_outcome(
    session: &SessionController,
    event: Option<Event>,
) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        Some(event) => print_event(&event),
        None => print_event(&session.snapshot()),
    }
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionAction::Start { plan, force } => {
            let active = match load_session(&db) {
                Ok(active) => active,
                Err(e) if force => {
                    discard_unreadable_session(&db, &*e)?;
                    None
                }
                Err(e) => return Err(e),
            };
            if let Some(active) = active {
                if !force {
                    return Err(
                        "a session is already active; finish it, run `session abandon`, or pass --force"
                            .into(),
                    );
                }
                print_event(&active.teardown())?;
                db.kv_delete(SESSION_KEY)?;
            }
            let session = SessionController::start(load_plan(plan.as_ref())?)?;
            save_session(&db, &session)?;
            print_event(&session.started_event())?;
            print_event(&session.snapshot())?;
        }
        SessionAction::Advance => {
            let mut session = require_session(&db)?;
            let event = session.advance();
            save_session(&db, &session)?;
            print_outcome(&session, event)?;
        }
        SessionAction::Retreat => {
            let mut session = require_session(&db)?;
            let event = session.retreat();
            save_session(&db, &session)?;
            print_outcome(&session, event)?;
        }
        SessionAction::SkipRest => {
            let mut session = require_session(&db)?;
            let event = session.skip_rest();
            save_session(&db, &session)?;
            print_outcome(&session, event)?;
        }
        SessionAction::Status => {
            let mut session = require_session(&db)?;
            session.tick();
            save_session(&db, &session)?;
            print_event(&session.snapshot())?;
        }
        SessionAction::Rest => {
            let session = require_session(&db)?;
            if session.phase() != Phase::Resting {
                print_event(&session.snapshot())?;
                return Ok(());
            }
            let config = Config::load()?;
            let session = follow_rest(session, Duration::from_millis(config.rest.sample_interval_ms))?;
            save_session(&db, &session)?;
        }
        SessionAction::Submit => submit(&db)?,
        SessionAction::Abandon => match load_session(&db) {
            Ok(Some(session)) => {
                let event = session.teardown();
                db.kv_delete(SESSION_KEY)?;
                print_event(&event)?;
            }
            Ok(None) => return Err(NO_SESSION.into()),
            Err(e) => discard_unreadable_session(&db, &*e)?,
        },
    }

    Ok(())
}

/// Sample the rest clock until the athlete presses Enter, then skip the rest.
fn follow_rest(
    session: SessionController,
    period: Duration,
) -> Result<SessionController, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let shared = Arc::new(Mutex::new(session));

    runtime.block_on(async {
        let sampled = Arc::clone(&shared);
        let mut ticker = RestTicker::spawn(period, move || {
            let Ok(mut session) = sampled.lock() else {
                return false;
            };
            match session.tick() {
                Some(Event::RestTick {
                    rest_elapsed_secs, ..
                }) => {
                    println!("rest: {rest_elapsed_secs}s");
                    true
                }
                _ => false,
            }
        });

        eprintln!("resting; press Enter to continue");
        let read = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)
        })
        .await;
        ticker.stop();
        match read {
            Ok(Ok(0)) => {
                tracing::warn!("stdin closed; ending rest");
                Ok(())
            }
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(format!("failed to read stdin: {e}")),
            Err(e) => Err(format!("stdin reader stopped: {e}")),
        }
    })?;

    let mut session = shared
        .lock()
        .map_err(|_| "session state poisoned by rest sampler")?
        .clone();
    if let Some(event) = session.skip_rest() {
        print_event(&event)?;
    }
    Ok(session)
}

fn submit(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let session_id = require_session(db)?.session_id();
    let config = Config::load()?;

    let stale_after = Duration::from_secs(config.rewards.timeout_secs + CLAIM_GRACE_SECS);
    let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
    if !db.claim_submission(session_id, now_ms, stale_after)? {
        return Err(SubmissionError::InFlight.into());
    }
    let outcome = submit_claimed(db, &config, session_id);
    db.release_submission(session_id)?;
    outcome
}

fn submit_claimed(
    db: &Database,
    config: &Config,
    session_id: Uuid,
) -> Result<(), Box<dyn std::error::Error>> {
    // Re-read under the claim; another command may have settled it meanwhile.
    let mut session = require_session(db)?;
    if session.session_id() != session_id {
        return Err("the session was finished by another command".into());
    }

    // Rewards granted earlier but never recorded are not requested again.
    let rewards = match session.rewards().cloned() {
        Some(rewards) => rewards,
        None => {
            let gateway = HttpRewardsGateway::from_config(&config.rewards)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let outcome =
                runtime.block_on(session.submit_rewards(&gateway, config.rewards.max_attempts));
            match outcome {
                Ok(rewards) => rewards,
                Err(e) => {
                    // Keep the failed attempt count for the next retry.
                    save_session(db, &session)?;
                    return Err(e.into());
                }
            }
        }
    };

    let report = session.completion_report()?;
    let prior_level = db.latest_level()?;
    if let Err(e) = db.record_workout(
        session.session_id(),
        &report,
        &rewards,
        session.started_at(),
        chrono::Utc::now(),
    ) {
        // The rewards are granted; keep the session so they are not claimed again.
        save_session(db, &session)?;
        return Err(e.into());
    }

    println!("{}", present(&report, &rewards, prior_level));
    db.kv_delete(SESSION_KEY)?;
    Ok(())
}
