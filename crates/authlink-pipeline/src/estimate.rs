//! Progress and completion time estimation

use chrono::{DateTime, Local};
use std::time::Duration;

/// Rolling mean of per-id processing time
#[derive(Debug, Clone, Default)]
pub struct TimeEstimator {
    mean_secs: f64,
    count: u64,
}

/// Remaining work estimate
#[derive(Debug, Clone)]
pub struct Estimate {
    pub remaining: Duration,
    pub ready_at: DateTime<Local>,
}

impl TimeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one measurement, rounded to hundredths of a second
    ///
    /// Returns the rounded value in seconds.
    pub fn record(&mut self, elapsed: Duration) -> f64 {
        let secs = (elapsed.as_secs_f64() * 100.0).round() / 100.0;
        let total = self.mean_secs * self.count as f64 + secs;
        self.count += 1;
        self.mean_secs = total / self.count as f64;
        secs
    }

    pub fn mean_secs(&self) -> f64 {
        self.mean_secs
    }

    /// `None` when the remaining time does not fit a duration or a timestamp
    pub fn estimate(&self, remaining_items: u64) -> Option<Estimate> {
        let secs = (remaining_items as f64 * self.mean_secs).max(0.0);
        let remaining = Duration::try_from_secs_f64(secs).ok()?;
        let ready_at = Local::now().checked_add_signed(chrono::Duration::from_std(remaining).ok()?)?;
        Some(Estimate { remaining, ready_at })
    }
}

/// `HH:MM:SS`, hours unbounded
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Position of `id` within `0..=last_id`, floored to two decimals
pub fn percent_done(id: u64, last_id: u64) -> f64 {
    if last_id == 0 {
        return 100.0;
    }
    ((id as f64 / last_id as f64) * 10_000.0).floor() / 100.0
}
