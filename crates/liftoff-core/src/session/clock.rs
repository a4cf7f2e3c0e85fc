//! Rest clock.
//!
//! A single-shot stopwatch measured as "now minus start" on the wall clock,
//! never as a count of callbacks. Sampling late, or sampling from a different
//! process after the session was persisted, still yields the right elapsed
//! time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestClock {
    /// Epoch milliseconds of the last `start`, `None` while stopped.
    #[serde(default)]
    started_at_ms: Option<u64>,
}

impl RestClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    /// Start, or restart from zero if already running.
    pub fn start(&mut self) {
        self.start_at(now_ms());
    }

    pub fn start_at(&mut self, now_ms: u64) {
        self.started_at_ms = Some(now_ms);
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        self.started_at_ms = None;
    }

    /// Whole seconds since start; 0 when stopped.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs_at(now_ms())
    }

    /// A wall clock that stepped backwards saturates at 0.
    pub fn elapsed_secs_at(&self, now_ms: u64) -> u64 {
        self.started_at_ms
            .map(|start| now_ms.saturating_sub(start) / 1000)
            .unwrap_or(0)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
