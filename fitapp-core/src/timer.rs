//! Elapsed and rest timers.
//!
//! A [`Stopwatch`] is plain state read against an injected clock, so the
//! session core never depends on real delays. The live display is driven by a
//! [`Ticker`], a tokio task that emits a tick every period until it is dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Whole seconds from `since` to `now`, never negative.
pub fn whole_seconds_between(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let secs = (now - since).num_seconds().max(0);
    Duration::from_secs(secs as u64)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    started_at: Option<DateTime<Utc>>,
}

impl Stopwatch {
    /// Starts counting from zero at `now`, discarding any previous run.
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.started_at = Some(now);
    }

    /// Stops and zeroes the stopwatch.
    pub fn reset(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.started_at
            .map(|start| whole_seconds_between(start, now))
            .unwrap_or_default()
    }
}

/// `H:MM:SS`, hours unbounded.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

/// `M:SS`, minutes unbounded.
pub fn format_rest(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

/// Periodic tick source. Dropping the ticker cancels its task.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Sends a clone of `tick` on `tx` every `period`, starting one period
    /// from now. Must be called from within a tokio runtime.
    pub fn spawn<T>(period: Duration, tick: T, tx: UnboundedSender<T>) -> Self
    where
        T: Clone + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(tick.clone()).is_err() {
                    debug!("Ticker receiver dropped, stopping");
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn every_second<T>(tick: T, tx: UnboundedSender<T>) -> Self
    where
        T: Clone + Send + 'static,
    {
        Self::spawn(TICK_PERIOD, tick, tx)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::sync::mpsc;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap() + chrono::TimeDelta::seconds(secs as i64)
    }

    #[test]
    fn elapsed_format_has_unbounded_hours() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(format_elapsed(Duration::from_secs(100 * 3600 + 59)), "100:00:59");
    }

    #[test]
    fn rest_format_has_unbounded_minutes() {
        assert_eq!(format_rest(Duration::from_secs(0)), "0:00");
        assert_eq!(format_rest(Duration::from_secs(65)), "1:05");
        assert_eq!(format_rest(Duration::from_secs(7200)), "120:00");
    }

    #[test]
    fn whole_seconds_floor_and_clamp() {
        let start = at(0);
        let later = start + chrono::TimeDelta::milliseconds(2999);
        assert_eq!(whole_seconds_between(start, later), Duration::from_secs(2));
        assert_eq!(whole_seconds_between(later, start), Duration::ZERO);
    }

    #[test]
    fn stopwatch_restart_and_reset() {
        let mut watch = Stopwatch::default();
        assert!(!watch.is_running());
        assert_eq!(watch.elapsed(at(10)), Duration::ZERO);

        watch.restart(at(10));
        assert_eq!(watch.elapsed(at(75)), Duration::from_secs(65));

        watch.restart(at(80));
        assert_eq!(watch.elapsed(at(81)), Duration::from_secs(1));

        watch.reset();
        assert!(!watch.is_running());
        assert_eq!(watch.elapsed(at(200)), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_ticks_each_period_and_stops_on_drop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        let ticker = Ticker::every_second("elapsed", tx);

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some("elapsed"));
        }
        assert!(started.elapsed() >= Duration::from_secs(3));

        drop(ticker);
        assert_eq!(rx.recv().await, None);
    }
}
