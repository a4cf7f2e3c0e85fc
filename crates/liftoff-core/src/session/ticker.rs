//! Periodic rest sampling.
//!
//! The ticker only decides *when* to sample; the elapsed value always comes
//! from the rest clock's wall-clock delta, so throttled or missed ticks never
//! skew it. The background task lives exactly as long as the ticker.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct RestTicker {
    handle: Option<JoinHandle<()>>,
}

impl RestTicker {
    /// Invoke `on_sample` every `period` until it returns `false` or the
    /// ticker is stopped or dropped. The first sample fires immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(period: Duration, mut on_sample: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !on_sample() {
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for RestTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
