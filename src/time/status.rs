//! Match Status Derivation
//!
//! Pure functions of `(instant, clock.now())`. Nothing is cached between
//! calls, so a polling loop sees transitions as soon as the clock moves.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time::Clock;

/// Minutes after kickoff during which a match counts as live.
///
/// Covers both halves, half-time and stoppage. Extra time and penalties run
/// past it and are reported FINISHED early.
pub const LIVE_WINDOW_MINUTES: i64 = 130;

/// Bets close this many minutes before kickoff.
pub const BET_LOCKOUT_MINUTES: i64 = 5;

// == Day Bucket ==
/// Calendar day of an instant relative to the clock's current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayBucket {
    Yesterday,
    Today,
    Tomorrow,
    Other,
}

// == Match Status ==
/// Three-state lifecycle of a match. FINISHED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Finished,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        self == MatchStatus::Finished
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStatus::Upcoming => "UPCOMING",
            MatchStatus::Live => "LIVE",
            MatchStatus::Finished => "FINISHED",
        };
        f.write_str(label)
    }
}

/// Compares the calendar day of `instant` with today, yesterday and tomorrow.
pub fn classify_day_bucket(clock: &dyn Clock, instant: DateTime<Utc>) -> DayBucket {
    let today = clock.now().date_naive();
    let day = instant.date_naive();

    if day == today {
        DayBucket::Today
    } else if Some(day) == today.pred_opt() {
        DayBucket::Yesterday
    } else if Some(day) == today.succ_opt() {
        DayBucket::Tomorrow
    } else {
        DayBucket::Other
    }
}

/// Derives the lifecycle state of a match kicking off at `instant`.
pub fn derive_status(clock: &dyn Clock, instant: DateTime<Utc>) -> MatchStatus {
    if classify_day_bucket(clock, instant) == DayBucket::Yesterday {
        return MatchStatus::Finished;
    }

    let delta = instant - clock.now();
    if delta > Duration::zero() {
        MatchStatus::Upcoming
    } else if delta >= -Duration::minutes(LIVE_WINDOW_MINUTES) {
        MatchStatus::Live
    } else {
        MatchStatus::Finished
    }
}

/// Time left before `instant` as `HH:MM:SS`, or `00:00:00` once reached.
pub fn remaining_duration(clock: &dyn Clock, instant: DateTime<Utc>) -> String {
    format_remaining(instant - clock.now())
}

/// Formats a countdown; hours are not wrapped at 24.
pub fn format_remaining(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return "00:00:00".to_string();
    }

    let total_seconds = remaining.num_seconds();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// True while a bet on a match at `instant` may still be placed.
pub fn is_wagerable(clock: &dyn Clock, instant: DateTime<Utc>) -> bool {
    instant > clock.now() + Duration::minutes(BET_LOCKOUT_MINUTES)
}
