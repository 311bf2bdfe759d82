//! Background Tasks Module
//!
//! Contains timer-driven tasks that poll the time authority.
//!
//! # Tasks
//! - Match clock: republishes a match's status and countdown every tick

mod match_clock;

pub use match_clock::{
    spawn_match_clock, spawn_match_clock_from_config, MatchClock, MatchClockSnapshot,
};
