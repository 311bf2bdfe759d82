//! Match Schedule Parsing
//!
//! Turns the loosely-typed date and time fields of a fixture into one
//! sortable UTC instant.
//!
//! Upstream feeds only keep a kickoff time until the match starts; after that
//! the time field carries the score ("2-1", "1-0 (24')"). A score is placed at
//! noon of its day, or at 23:59:59 when the day is yesterday so it always
//! compares as concluded. The result is an ordering proxy, not the true kickoff.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::time::Clock;

// == Date Token ==
/// Resolved meaning of a fixture's date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    Today,
    Tomorrow,
    Yesterday,
    Calendar(NaiveDate),
}

impl DateToken {
    /// Parses a date field.
    ///
    /// Relative words are matched case-insensitively as substrings, in French
    /// or English, checked in the order today, tomorrow, yesterday. Anything
    /// else is read as `YYYY-MM-DD` (or an RFC 3339 timestamp's date) and
    /// falls back to today when unparseable.
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.to_lowercase();

        if lowered.contains("aujourd") || lowered.contains("today") {
            return DateToken::Today;
        }
        if lowered.contains("demain") || lowered.contains("tomorrow") {
            return DateToken::Tomorrow;
        }
        if lowered.contains("hier") || lowered.contains("yesterday") {
            return DateToken::Yesterday;
        }

        let trimmed = raw.trim();
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(trimmed)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc).date_naive())
            })
            .map(DateToken::Calendar)
            .unwrap_or(DateToken::Today)
    }

    /// Calendar day this token designates, relative to `today`.
    pub fn resolve(self, today: NaiveDate) -> NaiveDate {
        match self {
            DateToken::Today => today,
            DateToken::Tomorrow => today.succ_opt().unwrap_or(today),
            DateToken::Yesterday => today.pred_opt().unwrap_or(today),
            DateToken::Calendar(date) => date,
        }
    }
}

// == Match Time ==
/// A fixture's time field: either a kickoff clock time or a score string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchTime {
    Scheduled { hour: u32, minute: u32 },
    Score(String),
}

impl MatchTime {
    /// Classifies a time field by its content.
    ///
    /// Contains `:` and no `-` means a clock time; unreadable hour or minute
    /// components count as zero. Everything else is a score.
    pub fn parse(raw: &str) -> Self {
        if raw.contains(':') && !raw.contains('-') {
            let mut parts = raw.split(':');
            let hour = parse_component(parts.next());
            let minute = parse_component(parts.next());
            MatchTime::Scheduled { hour, minute }
        } else {
            MatchTime::Score(raw.to_string())
        }
    }

    pub fn is_score(&self) -> bool {
        matches!(self, MatchTime::Score(_))
    }
}

fn parse_component(part: Option<&str>) -> u32 {
    part.and_then(|p| p.trim().parse().ok()).unwrap_or(0)
}

// == Resolve ==
/// Combines a date field and a time field into one UTC instant.
pub fn resolve_match_instant(clock: &dyn Clock, date_field: &str, time_field: &str) -> DateTime<Utc> {
    let token = DateToken::parse(date_field);
    let date = token.resolve(clock.now().date_naive());
    resolve_on(date, token, &MatchTime::parse(time_field))
}

/// Places `time` on `date`, applying the score sentinels.
pub fn resolve_on(date: NaiveDate, token: DateToken, time: &MatchTime) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN).and_utc();

    match time {
        MatchTime::Scheduled { hour, minute } => {
            // Out-of-range components roll over into the following days
            let offset = Duration::hours(i64::from(*hour)) + Duration::minutes(i64::from(*minute));
            midnight.checked_add_signed(offset).unwrap_or(midnight)
        }
        MatchTime::Score(_) if token == DateToken::Yesterday => {
            midnight + Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59)
        }
        MatchTime::Score(_) => midnight + Duration::hours(12),
    }
}
