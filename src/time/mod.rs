//! Time Authority Module
//!
//! Injectable clock plus the match status, countdown and betting-window
//! calculations derived from it.

mod clock;
mod schedule;
mod status;

pub use clock::{Clock, ManualClock, SystemClock};
pub use schedule::{resolve_match_instant, resolve_on, DateToken, MatchTime};
pub use status::{
    classify_day_bucket, derive_status, format_remaining, is_wagerable, remaining_duration,
    DayBucket, MatchStatus, BET_LOCKOUT_MINUTES, LIVE_WINDOW_MINUTES,
};
