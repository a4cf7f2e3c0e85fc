//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Workouts whose rewards were accepted
//! - Workout statistics (daily and all-time)
//! - Key-value store for application state (the active session)
//! - Submission claims, so only one process talks to the rewards service for a
//!   session at a time

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::rewards::{CompletionReport, RewardSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: i64,
    pub session_id: String,
    pub workout_id: String,
    pub total_exercises: u32,
    pub total_sets: u32,
    pub points_gained: u32,
    pub new_level: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkoutStats {
    pub total_workouts: u64,
    pub total_sets: u64,
    pub total_points: u64,
    pub today_workouts: u64,
    pub today_sets: u64,
    /// Level granted by the most recent workout, if any.
    pub current_level: Option<u32>,
}

/// SQLite database for workout history and session state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/liftoff/liftoff.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("liftoff.db");
        Self::open_at(&path)
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workouts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id      TEXT NOT NULL UNIQUE,
                workout_id      TEXT NOT NULL,
                total_exercises INTEGER NOT NULL,
                total_sets      INTEGER NOT NULL,
                points_gained   INTEGER NOT NULL,
                new_level       INTEGER NOT NULL,
                started_at      TEXT NOT NULL,
                completed_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS submission_claims (
                session_id    TEXT PRIMARY KEY,
                claimed_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_completed_at ON workouts(completed_at);",
        )?;
        Ok(())
    }

    /// Record a workout whose rewards were accepted.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including a second record for the
    /// same session.
    pub fn record_workout(
        &self,
        session_id: Uuid,
        report: &CompletionReport,
        rewards: &RewardSummary,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO workouts (session_id, workout_id, total_exercises, total_sets,
                                   points_gained, new_level, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session_id.to_string(),
                report.reference_id,
                report.total_exercises,
                report.total_completed_sets,
                rewards.points_gained,
                rewards.new_level,
                started_at.to_rfc3339(),
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent workouts first.
    pub fn list_workouts(&self, limit: usize) -> Result<Vec<WorkoutRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, workout_id, total_exercises, total_sets,
                    points_gained, new_level, started_at, completed_at
             FROM workouts
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(WorkoutRecord {
                id: row.get(0)?,
                session_id: row.get(1)?,
                workout_id: row.get(2)?,
                total_exercises: row.get(3)?,
                total_sets: row.get(4)?,
                points_gained: row.get(5)?,
                new_level: row.get(6)?,
                started_at: parse_timestamp(&row.get::<_, String>(7)?),
                completed_at: parse_timestamp(&row.get::<_, String>(8)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Level granted by the most recent workout.
    pub fn latest_level(&self) -> Result<Option<u32>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT new_level FROM workouts ORDER BY completed_at DESC, id DESC LIMIT 1",
                [],
                |row| row.get::<_, u32>(0),
            )
            .optional()?)
    }

    pub fn stats(&self) -> Result<WorkoutStats, DatabaseError> {
        let (total_workouts, total_sets, total_points) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(total_sets), 0), COALESCE(SUM(points_gained), 0)
             FROM workouts",
            [],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?, row.get::<_, u64>(2)?)),
        )?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_workouts, today_sets) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(total_sets), 0)
             FROM workouts
             WHERE completed_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;

        Ok(WorkoutStats {
            total_workouts,
            total_sets,
            total_points,
            today_workouts,
            today_sets,
            current_level: self.latest_level()?,
        })
    }

    /// Claim the rewards submission of `session_id` for this process.
    ///
    /// Returns `false` when another claim younger than `stale_after` exists.
    /// Older claims belong to a process that died mid-request and are taken
    /// over.
    pub fn claim_submission(
        &self,
        session_id: Uuid,
        now_ms: u64,
        stale_after: Duration,
    ) -> Result<bool, DatabaseError> {
        let id = session_id.to_string();
        let cutoff = now_ms.saturating_sub(stale_after.as_millis() as u64) as i64;
        self.conn.execute(
            "DELETE FROM submission_claims WHERE session_id = ?1 AND claimed_at_ms < ?2",
            params![id, cutoff],
        )?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO submission_claims (session_id, claimed_at_ms) VALUES (?1, ?2)",
            params![id, now_ms as i64],
        )?;
        Ok(inserted == 1)
    }

    /// Drop the claim of `session_id`. Missing claims are not an error.
    pub fn release_submission(&self, session_id: Uuid) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM submission_claims WHERE session_id = ?1",
            params![session_id.to_string()],
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store. Missing keys are not an error.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
