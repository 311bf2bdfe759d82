//! Match Clock Task
//!
//! Background task that re-derives a match's status, countdown and betting
//! window on a fixed interval and publishes them on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::Config;
use crate::time::{
    classify_day_bucket, derive_status, is_wagerable, remaining_duration, Clock, DayBucket,
    MatchStatus,
};

const MIN_TICK: Duration = Duration::from_millis(1);

// == Snapshot ==
/// Everything a match badge needs at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchClockSnapshot {
    pub status: MatchStatus,
    pub day: DayBucket,
    /// Countdown to kickoff as `HH:MM:SS`
    pub remaining: String,
    pub wagerable: bool,
}

impl MatchClockSnapshot {
    pub fn compute(clock: &dyn Clock, kickoff: DateTime<Utc>) -> Self {
        Self {
            status: derive_status(clock, kickoff),
            day: classify_day_bucket(clock, kickoff),
            remaining: remaining_duration(clock, kickoff),
            wagerable: is_wagerable(clock, kickoff),
        }
    }
}

// == Match Clock ==
/// Handle to a running match clock task.
///
/// Dropping the handle aborts the task, so the timer never outlives its owner.
#[derive(Debug)]
pub struct MatchClock {
    handle: JoinHandle<()>,
    rx: watch::Receiver<MatchClockSnapshot>,
}

impl MatchClock {
    /// A receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<MatchClockSnapshot> {
        self.rx.clone()
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> MatchClockSnapshot {
        self.rx.borrow().clone()
    }

    /// Stops the task. Receivers keep the last snapshot.
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// True once the task has stopped, either aborted or after FINISHED.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for MatchClock {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a task that republishes the snapshot for `kickoff` every `tick`.
///
/// The first snapshot is available immediately. The task ends by itself after
/// publishing a FINISHED snapshot, since that state is terminal. Must be called
/// from within a tokio runtime.
///
/// # Example
/// ```ignore
/// let clock: Arc<dyn Clock> = Arc::new(SystemClock);
/// let match_clock = spawn_match_clock(clock, kickoff, Duration::from_secs(1));
/// let mut rx = match_clock.subscribe();
/// while rx.changed().await.is_ok() {
///     render_badge(&rx.borrow());
/// }
/// ```
pub fn spawn_match_clock(
    clock: Arc<dyn Clock>,
    kickoff: DateTime<Utc>,
    tick: Duration,
) -> MatchClock {
    let tick = tick.max(MIN_TICK);
    let initial = MatchClockSnapshot::compute(clock.as_ref(), kickoff);
    let (tx, rx) = watch::channel(initial);

    let handle = tokio::spawn(async move {
        info!("Starting match clock for {} with tick {:?}", kickoff, tick);

        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately and the initial snapshot is already out
        interval.tick().await;

        loop {
            interval.tick().await;

            let snapshot = MatchClockSnapshot::compute(clock.as_ref(), kickoff);
            let finished = snapshot.status.is_terminal();

            if tx.send(snapshot).is_err() {
                debug!("Match clock for {}: no subscribers left", kickoff);
                break;
            }
            if finished {
                debug!("Match clock for {}: match finished", kickoff);
                break;
            }
        }
    });

    MatchClock { handle, rx }
}

/// Spawns a match clock ticking at `config.tick_interval()`.
pub fn spawn_match_clock_from_config(
    config: &Config,
    clock: Arc<dyn Clock>,
    kickoff: DateTime<Utc>,
) -> MatchClock {
    spawn_match_clock(clock, kickoff, config.tick_interval())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use chrono::TimeZone;
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_millis(10);
    const WAIT: Duration = Duration::from_secs(2);

    fn manual_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap(),
        ))
    }

    async fn wait_for_status(
        rx: &mut watch::Receiver<MatchClockSnapshot>,
        status: MatchStatus,
    ) -> MatchClockSnapshot {
        timeout(WAIT, async {
            loop {
                if rx.borrow_and_update().status == status {
                    return rx.borrow().clone();
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("status not reached in time")
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let clock = manual_clock();
        let kickoff = clock.now() + chrono::Duration::hours(1);

        let match_clock = spawn_match_clock(clock, kickoff, TICK);
        let snapshot = match_clock.latest();

        assert_eq!(snapshot.status, MatchStatus::Upcoming);
        assert_eq!(snapshot.day, DayBucket::Today);
        assert_eq!(snapshot.remaining, "01:00:00");
        assert!(snapshot.wagerable);
    }

    #[tokio::test]
    async fn test_follows_clock_to_live() {
        let clock = manual_clock();
        let kickoff = clock.now() + chrono::Duration::minutes(3);

        let match_clock = spawn_match_clock(clock.clone(), kickoff, TICK);
        let mut rx = match_clock.subscribe();
        assert!(!match_clock.latest().wagerable);

        clock.advance(chrono::Duration::minutes(4));
        let snapshot = wait_for_status(&mut rx, MatchStatus::Live).await;
        assert_eq!(snapshot.remaining, "00:00:00");
    }

    #[tokio::test]
    async fn test_tick_from_config() {
        let clock = manual_clock();
        let kickoff = clock.now() + chrono::Duration::minutes(1);
        let config = Config {
            tick_ms: 10,
            ..Config::default()
        };

        let match_clock = spawn_match_clock_from_config(&config, clock.clone(), kickoff);
        let mut rx = match_clock.subscribe();

        clock.advance(chrono::Duration::minutes(2));
        wait_for_status(&mut rx, MatchStatus::Live).await;
    }

    #[tokio::test]
    async fn test_task_ends_after_finished() {
        let clock = manual_clock();
        let kickoff = clock.now() - chrono::Duration::minutes(10);

        let match_clock = spawn_match_clock(clock.clone(), kickoff, TICK);
        let mut rx = match_clock.subscribe();

        clock.advance(chrono::Duration::minutes(200));
        wait_for_status(&mut rx, MatchStatus::Finished).await;

        timeout(WAIT, async {
            while !match_clock.is_finished() {
                tokio::time::sleep(TICK).await;
            }
        })
        .await
        .expect("task should stop after FINISHED");
    }

    #[tokio::test]
    async fn test_stop_and_drop_abort_the_task() {
        let clock = manual_clock();
        let kickoff = clock.now() + chrono::Duration::hours(2);

        let stopped = spawn_match_clock(clock.clone(), kickoff, TICK);
        stopped.stop();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(stopped.is_finished(), "Task should be finished after stop");

        let dropped = spawn_match_clock(clock, kickoff, TICK);
        let mut rx = dropped.subscribe();
        drop(dropped);

        // The sender goes away with the aborted task
        let closed = timeout(WAIT, async {
            while rx.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok(), "Channel should close after the handle is dropped");
    }
}
